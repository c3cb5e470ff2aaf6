// Unit tests for business rules

use super::*;
use std::path::PathBuf;

fn clip_payload(url: &str, start: &str, end: &str) -> ClipPayload {
    ClipPayload {
        source_url: url.to_string(),
        range: CutRange::new(TimeSpec::parse(start).unwrap(), TimeSpec::parse(end).unwrap())
            .unwrap(),
    }
}

#[test]
fn test_transitions_follow_state_machine() {
    use JobStatus::*;
    assert!(StatusTransitions::is_allowed(Idle, Pending));
    assert!(StatusTransitions::is_allowed(Pending, Idle));
    assert!(StatusTransitions::is_allowed(Pending, Completed));
    assert!(StatusTransitions::is_allowed(Pending, Failed));
    assert!(StatusTransitions::is_allowed(Pending, Cancelled));
    assert!(StatusTransitions::is_allowed(Cancelled, Idle));

    assert!(!StatusTransitions::is_allowed(Completed, Pending));
    assert!(!StatusTransitions::is_allowed(Failed, Completed));
    assert!(!StatusTransitions::is_allowed(Cancelled, Pending));
    assert!(!StatusTransitions::is_allowed(Idle, Completed));
}

#[test]
fn test_video_id_extraction() {
    assert_eq!(
        ClipRules::video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10").as_deref(),
        Some("dQw4w9WgXcQ")
    );
    assert_eq!(
        ClipRules::video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
        Some("dQw4w9WgXcQ")
    );
    assert_eq!(ClipRules::video_id("https://www.youtube.com/watch?v="), None);
    assert_eq!(ClipRules::video_id("not a url"), None);
}

#[test]
fn test_clip_rules_accept_ten_minutes() {
    let payload = clip_payload("https://www.youtube.com/watch?v=abc", "00:00:00", "00:10:00");
    assert!(ClipRules::validate(&payload).is_ok());
}

#[test]
fn test_clip_rules_reject_long_clip() {
    let payload = clip_payload("https://www.youtube.com/watch?v=abc", "00:00:00", "00:10:01");
    let err = ClipRules::validate(&payload).unwrap_err();
    assert_eq!(err, DomainError::InvalidTimeRange("Max duration is 10 mins".to_string()));
}

#[test]
fn test_clip_rules_require_url() {
    let payload = clip_payload("  ", "00:00:00", "00:00:10");
    assert!(matches!(
        ClipRules::validate(&payload),
        Err(DomainError::ValidationFailed(_))
    ));
}

#[test]
fn test_speed_rules_bounds() {
    assert!(SpeedRules::validate_speed_factor(0.25).is_ok());
    assert!(SpeedRules::validate_speed_factor(2.0).is_ok());
    assert!(SpeedRules::validate_speed_factor(0.2).is_err());
    assert!(SpeedRules::validate_speed_factor(2.05).is_err());
    assert!(SpeedRules::validate_speed_factor(f64::NAN).is_err());
}

#[test]
fn test_speed_rules_upload_size_limit() {
    let payload = SpeedEditPayload {
        speed_factor: 1.5,
        source: SpeedSource::Upload {
            path: PathBuf::from("video.mp4"),
        },
    };
    assert!(SpeedRules::validate(&payload, Some(MAX_UPLOAD_SIZE_BYTES)).is_ok());
    assert!(SpeedRules::validate(&payload, Some(MAX_UPLOAD_SIZE_BYTES + 1)).is_err());
    assert!(SpeedRules::validate(&payload, None).is_err());
}

#[test]
fn test_speed_rules_clip_source_needs_id() {
    let payload = SpeedEditPayload {
        speed_factor: 1.0,
        source: SpeedSource::Clip {
            artifact_id: String::new(),
        },
    };
    assert!(SpeedRules::validate(&payload, None).is_err());
}

#[test]
fn test_email_rules() {
    assert!(EmailRules::validate("someone@example.com").is_ok());
    assert!(EmailRules::validate("someone").is_err());
    assert!(EmailRules::validate("@example.com").is_err());
    assert!(EmailRules::validate("a@b@c").is_err());
}

#[test]
fn test_polling_cadence_for_clips() {
    let short = clip_payload("https://youtu.be/x", "00:00:00", "00:00:59");
    let medium = clip_payload("https://youtu.be/x", "00:00:00", "00:01:00");
    let long = clip_payload("https://youtu.be/x", "00:00:00", "00:03:00");

    assert_eq!(PollingPolicy::for_clip(&short.range), Duration::from_millis(2000));
    assert_eq!(PollingPolicy::for_clip(&medium.range), Duration::from_millis(5000));
    assert_eq!(PollingPolicy::for_clip(&long.range), Duration::from_millis(7000));
}

#[test]
fn test_polling_cadence_for_speed_edits() {
    assert_eq!(PollingPolicy::for_speed_edit(None), Duration::from_millis(1500));
    assert_eq!(PollingPolicy::for_speed_edit(Some(0.5)), Duration::from_millis(1500));
    assert_eq!(PollingPolicy::for_speed_edit(Some(4.9)), Duration::from_millis(2500));
    assert_eq!(PollingPolicy::for_speed_edit(Some(14.0)), Duration::from_millis(4000));
    assert_eq!(PollingPolicy::for_speed_edit(Some(40.0)), Duration::from_millis(7000));
}

#[test]
fn test_timeout_message() {
    assert_eq!(
        timeout_message(DEFAULT_JOB_TIMEOUT),
        "Processing timed out after 300 seconds"
    );
}
