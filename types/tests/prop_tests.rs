use proptest::prelude::*;

use voxverify_types::{
    ProgressStage, SessionId, SessionStatus, SessionUpdate, Timestamp, VerificationResult,
    VerificationSession,
};

fn arb_update() -> impl Strategy<Value = SessionUpdate> {
    prop_oneof![
        Just(SessionUpdate::Pending),
        (any::<bool>(), 0.0f64..=1.0).prop_map(|(verified, confidence)| {
            SessionUpdate::Completed(VerificationResult::new(verified, confidence).unwrap())
        }),
        "[a-z ]{0,20}".prop_map(|reason| SessionUpdate::Failed { reason }),
    ]
}

proptest! {
    /// A result can be built exactly when confidence lies in [0, 1].
    #[test]
    fn confidence_validity(confidence in -2.0f64..3.0, verified in any::<bool>()) {
        let built = VerificationResult::new(verified, confidence);
        prop_assert_eq!(built.is_ok(), (0.0..=1.0).contains(&confidence));
    }

    /// Whatever sequence of updates arrives, once a session is terminal its
    /// status never changes again, and a result exists iff it is Completed.
    #[test]
    fn terminal_state_is_sticky(updates in prop::collection::vec(arb_update(), 1..12)) {
        let mut session =
            VerificationSession::pending(SessionId::new("sess").unwrap(), Timestamp::new(0));
        let mut first_terminal: Option<SessionStatus> = None;

        for (i, update) in updates.into_iter().enumerate() {
            let _ = session.apply(update, Timestamp::new(i as u64 + 1));
            if let Some(status) = first_terminal {
                prop_assert_eq!(session.status(), status);
            } else if session.is_terminal() {
                first_terminal = Some(session.status());
            }
            prop_assert_eq!(
                session.result().is_some(),
                session.status() == SessionStatus::Completed
            );
        }
    }
}

#[test]
fn progress_stages_are_ordered() {
    let stages = [
        ProgressStage::Starting,
        ProgressStage::Calling,
        ProgressStage::Processing,
        ProgressStage::Completed,
    ];
    assert!(stages.windows(2).all(|w| w[0] < w[1]));
    assert!(ProgressStage::Processing < ProgressStage::Failed);
    assert!(ProgressStage::Failed.is_terminal());
    assert!(!ProgressStage::Calling.is_terminal());
}
