use crate::common::{spawn_server, test_app, ScriptedBackend};
use aramiyot::client::{
    boards::{BoardBackend, BoardsStore, RemoteBoards},
    ApiClient, ClientError,
};
use aramiyot::models::{catalog::find_resource, Board};
use std::sync::Arc;

async fn signed_in_client(base_url: &str) -> ApiClient {
    let mut api = ApiClient::new(base_url);
    api.sign_in_anonymously().await.unwrap();
    api
}

async fn server() -> String {
    spawn_server(test_app(Arc::new(ScriptedBackend::default())).await).await
}

#[tokio::test]
async fn test_sleep_tips_board_survives_reload() {
    let base_url = server().await;
    let api = signed_in_client(&base_url).await;
    let backend: Arc<dyn BoardBackend> = Arc::new(RemoteBoards::new(api));

    let mut store = BoardsStore::load(backend.clone()).await.unwrap();
    assert!(store.boards().is_empty());

    let board = store.create_board("Sleep Tips");
    store
        .add_resource_to_board(&board.id, find_resource("CWR004").unwrap().clone())
        .unwrap();
    store.flush().await.unwrap();

    let reloaded = BoardsStore::load(backend).await.unwrap();
    assert_eq!(reloaded.boards().len(), 1);
    let stored = reloaded.get_board_by_id(&board.id).unwrap();
    assert_eq!(stored.name, "Sleep Tips");
    assert_eq!(stored.resources.len(), 1);
    assert_eq!(stored.resources[0].id, "CWR004");
}

#[tokio::test]
async fn test_adding_same_resource_twice_keeps_latest_copy() {
    let base_url = server().await;
    let backend: Arc<dyn BoardBackend> =
        Arc::new(RemoteBoards::new(signed_in_client(&base_url).await));

    let mut store = BoardsStore::load(backend.clone()).await.unwrap();
    let board = store.create_board("Favourites");

    let original = find_resource("CWR001").unwrap().clone();
    let mut edited = original.clone();
    edited.title = "Edited title".to_string();

    store.add_resource_to_board(&board.id, original).unwrap();
    store.add_resource_to_board(&board.id, edited).unwrap();
    assert_eq!(store.get_board_by_id(&board.id).unwrap().resources.len(), 1);
    store.flush().await.unwrap();

    let reloaded = BoardsStore::load(backend).await.unwrap();
    let resources = &reloaded.get_board_by_id(&board.id).unwrap().resources;
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].title, "Edited title");
}

#[tokio::test]
async fn test_remove_absent_resource_is_noop() {
    let base_url = server().await;
    let backend: Arc<dyn BoardBackend> =
        Arc::new(RemoteBoards::new(signed_in_client(&base_url).await));

    let mut store = BoardsStore::load(backend.clone()).await.unwrap();
    let board = store.create_board("Mindfulness");
    store
        .add_resource_to_board(&board.id, find_resource("CWR002").unwrap().clone())
        .unwrap();

    store.remove_resource_from_board(&board.id, "CWR999");
    store.flush().await.unwrap();

    let reloaded = BoardsStore::load(backend).await.unwrap();
    assert_eq!(reloaded.get_board_by_id(&board.id).unwrap().resources.len(), 1);
}

#[tokio::test]
async fn test_rename_and_delete_are_persisted() {
    let base_url = server().await;
    let backend: Arc<dyn BoardBackend> =
        Arc::new(RemoteBoards::new(signed_in_client(&base_url).await));

    let mut store = BoardsStore::load(backend.clone()).await.unwrap();
    let keep = store.create_board("Draft");
    let gone = store.create_board("Temporary");
    store.update_board_name(&keep.id, "Evening Routine").unwrap();
    assert!(store.delete_board(&gone.id));
    store.flush().await.unwrap();

    let reloaded = BoardsStore::load(backend).await.unwrap();
    assert_eq!(reloaded.boards().len(), 1);
    assert_eq!(reloaded.boards()[0].name, "Evening Routine");
}

#[tokio::test]
async fn test_boards_are_private_to_each_identity() {
    let base_url = server().await;
    let alice = signed_in_client(&base_url).await;
    let bob = signed_in_client(&base_url).await;

    alice.put_board(&Board::new("shared-id", "Alice's board")).await.unwrap();

    assert!(bob.list_boards().await.unwrap().is_empty());

    let err = bob
        .put_board(&Board::new("shared-id", "Bob's takeover"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 403, .. }));

    let boards = alice.list_boards().await.unwrap();
    assert_eq!(boards[0].name, "Alice's board");
}
