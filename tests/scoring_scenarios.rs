use accutype::{edit_distance, score, ScoreError, ScoreRequest};
use assert_matches::assert_matches;
use chrono::{DateTime, Duration, Local, TimeZone};

const FOX: &str = "The quick red fox jumped over the lazy brown dog.";

fn start() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 1, 15, 16, 45, 0).unwrap()
}

fn request(given: &str, typed: &str, count: Option<usize>, secs: i64) -> ScoreRequest {
    ScoreRequest {
        given_text: given.to_string(),
        typed_text: typed.to_string(),
        typed_character_count: count,
        start_time: start(),
        end_time: start() + Duration::seconds(secs),
        user_name: "Unknown".to_string(),
    }
}

#[test]
fn identical_text_scores_full_accuracy() {
    let result = score(&request(FOX, FOX, Some(FOX.chars().count()), 20)).unwrap();
    assert_eq!(result.edit_distance(), 0);
    assert_eq!(result.accuracy_percent(), 100);
    assert_eq!(result.timestamp(), "01/15/25 04:45 PM");
}

#[test]
fn typos_count_as_edits() {
    let typed = "The Quick read fox jumped ovre the lazy brown dog";
    let result = score(&request(FOX, typed, Some(FOX.chars().count()), 20)).unwrap();
    assert_eq!(result.edit_distance(), 5);
    assert_eq!(result.edit_distance(), edit_distance(FOX, typed));
}

#[test]
fn no_keystrokes_means_no_result() {
    assert_matches!(score(&request(FOX, "", None, 20)), Err(ScoreError::NothingTyped));
    assert_matches!(score(&request(FOX, "", Some(0), 20)), Err(ScoreError::NothingTyped));
}

#[test]
fn words_per_minute_from_single_space_split() {
    let text = "one two three four";
    let result = score(&request(text, text, Some(18), 30)).unwrap();
    assert_eq!(result.words(), 4);
    assert_eq!(result.duration_seconds(), 30);
    assert_eq!(result.words_per_minute(), 8);
}

#[test]
fn multi_sentence_prompt_only_scores_attempted_part() {
    let given = format!("{FOX}\nA journey of a thousand miles begins with a single step.");
    let typed = "The quick red fox jumped over the lazy brown dog. A journey";
    let count = typed.chars().count();
    let result = score(&request(&given, typed, Some(count), 40)).unwrap();

    // newline shown vs space typed between the sentences
    assert_eq!(result.edit_distance(), 1);
    assert_eq!(result.accuracy_percent(), 98);
    assert_eq!(result.given_text(), given);
}
