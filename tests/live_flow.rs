mod common;

use std::{sync::Arc, time::Duration};

use ksot_live::api::session::SessionApi;
use ksot_live::live::flow::JOIN_REJECTED;
use ksot_live::live::{FlowState, PollIntervals, Screen, SessionFlow};
use tokio::{runtime::Handle, time};

use common::{MockServer, CORRECT_OPTION, SESSION_CODE};

fn flow(api: Arc<dyn SessionApi>) -> SessionFlow {
    SessionFlow::new(api, Handle::current(), PollIntervals::default(), 20)
}

/// Let spawned requests finish, then apply them.
async fn settle(flows: &mut [&mut SessionFlow]) {
    time::sleep(Duration::from_millis(10)).await;
    for flow in flows.iter_mut() {
        flow.pump();
    }
}

fn join_error(flow: &SessionFlow) -> Option<&str> {
    match flow.screen() {
        Screen::Join(form) => form.error.as_deref(),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn host_and_guest_play_through_to_results() {
    let server = MockServer::new();
    let mut host = flow(server.client("1", "Host Player"));
    let mut guest = flow(server.client("2", "Guest Player"));

    host.start_create_flow();
    settle(&mut [&mut host]).await;
    let Screen::Create(wizard) = host.screen_mut() else {
        panic!("expected the create wizard");
    };
    assert_eq!(wizard.quiz_id, Some(5));
    assert_eq!(wizard.time_per_question, 20);

    host.submit_create();
    settle(&mut [&mut host]).await;
    assert_eq!(host.state(), FlowState::Lobby);
    assert_eq!(host.session_code().map(|c| c.as_str()), Some(SESSION_CODE));
    assert!(host.is_host());

    settle(&mut [&mut host]).await;
    let Screen::Lobby(lobby) = host.screen() else {
        panic!("expected the lobby");
    };
    assert_eq!(lobby.view().participants.len(), 1);

    guest.submit_join_code("ab12cd");
    settle(&mut [&mut guest]).await;
    assert_eq!(guest.state(), FlowState::Lobby);
    assert!(!guest.is_host());

    let Screen::Lobby(lobby) = host.screen_mut() else {
        panic!("expected the lobby");
    };
    lobby.trigger_start();
    settle(&mut [&mut host]).await;
    assert_eq!(host.state(), FlowState::Game);

    // The guest only learns about the start from its next lobby poll.
    time::sleep(Duration::from_secs(2)).await;
    guest.pump();
    assert_eq!(guest.state(), FlowState::Game);

    settle(&mut [&mut host, &mut guest]).await;
    for player in [&host, &guest] {
        let Screen::Game(game) = player.screen() else {
            panic!("expected the game");
        };
        let question = game.view().current_question.as_ref().map(|q| q.id.as_str());
        assert_eq!(question, Some("101"));
    }

    let Screen::Game(game) = guest.screen_mut() else {
        panic!("expected the game");
    };
    game.submit_answer(CORRECT_OPTION);
    settle(&mut [&mut host, &mut guest]).await;

    server.complete();
    time::sleep(Duration::from_secs(1)).await;
    host.pump();
    guest.pump();

    for player in [&host, &guest] {
        let Screen::Results(standings) = player.screen() else {
            panic!("expected results");
        };
        let order: Vec<_> = standings
            .iter()
            .map(|s| (s.rank, s.participant.name.as_str(), s.participant.score))
            .collect();
        assert_eq!(order, vec![(1, "Guest Player", 10), (2, "Host Player", 0)]);
    }
}

#[tokio::test(start_paused = true)]
async fn short_code_is_rejected_without_a_request() {
    let server = MockServer::new();
    let mut guest = flow(server.client("2", "Guest Player"));

    guest.start_join_flow();
    guest.submit_join_code("AB12C");
    settle(&mut [&mut guest]).await;

    assert_eq!(join_error(&guest), Some("Code must be 6 characters"));
    assert_eq!(guest.state(), FlowState::Join);
    assert_eq!(server.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_join_stays_on_the_form() {
    let server = MockServer::new();
    server.reject_joins();
    let mut guest = flow(server.client("2", "Guest Player"));

    guest.start_join_flow();
    guest.submit_join_code(SESSION_CODE);
    settle(&mut [&mut guest]).await;

    assert_eq!(join_error(&guest), Some(JOIN_REJECTED));
    assert_eq!(guest.state(), FlowState::Join);
    assert!(guest.session_code().is_none());
}
