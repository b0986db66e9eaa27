use studio_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    for msg in [Msg::NoOp, Msg::Tick, Msg::NoticeDismissed, Msg::UploadCleared] {
        let (next, effects) = update(state.clone(), msg);

        assert_eq!(state, next);
        assert!(effects.is_empty());
    }
}

#[test]
fn messages_after_shutdown_are_ignored() {
    let (state, _) = update(AppState::new(), Msg::Shutdown);
    let (next, effects) = update(state.clone(), Msg::ChatInputChanged("hi".to_string()));

    assert_eq!(state, next);
    assert!(effects.is_empty());
    assert!(next.is_closed());
}
