//! The client against a real server on an ephemeral port.

use std::sync::Arc;

use coursemart::{EntityId, EventForm, NewShop};
use coursemart_client::{ClientError, CoursemartClient, Credentials, ImageUpload};
use coursemart_memory::InMemoryDocumentStore;
use coursemart_server::auth::AdminTokens;
use coursemart_server::routes::router;
use coursemart_server::state::AppState;
use coursemart_server::uploads::ImageStore;
use tempfile::TempDir;
use tokio::net::TcpListener;

const TOKEN: &str = "client-test-token";

struct RunningServer {
    client: CoursemartClient,
    #[allow(dead_code)]
    uploads: TempDir,
}

async fn start_server() -> RunningServer {
    let uploads = tempfile::tempdir().expect("tempdir");
    let state = AppState::new(
        Arc::new(InMemoryDocumentStore::new()),
        ImageStore::new(uploads.path()),
        AdminTokens::parse(TOKEN),
    );
    let app = router(state, 1024 * 1024);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port is available");
    let address = listener.local_addr().expect("bound address");
    tokio::spawn(coursemart_server::serve(listener, app));

    RunningServer {
        client: CoursemartClient::new(format!("http://{address}")),
        uploads,
    }
}

fn admin() -> Credentials {
    Credentials::bearer(TOKEN)
}

fn workshop_form() -> EventForm {
    EventForm::default()
        .with("title", "Design Workshop")
        .with("eventFee", "25")
        .with("location", "Studio 3")
        .with("category", "Art & Design")
        .with("eventDescription", "Hands-on typography")
        .with("resourcePerson", "Grace Hopper")
        .with("eventDate", "2025-06-14")
        .with("startTime", "09:00")
        .with("allocatedSeats", "12")
}

#[tokio::test]
async fn shop_round_trip() {
    let server = start_server().await;
    let client = &server.client;

    let created = client
        .create_shop(
            &NewShop::named("Intro to Go").price("Free").category("Programming"),
            &admin(),
        )
        .await
        .expect("create succeeds");
    let id = created.id.to_string();

    let fetched = client.get_shop(&id).await.expect("get succeeds");
    assert_eq!(fetched, created);
    assert_eq!(client.list_shops().await.expect("list succeeds"), vec![created]);

    let message = client.delete_shop(&id, &admin()).await.expect("delete succeeds");
    assert_eq!(message, "Course deleted successfully");

    let error = client.get_shop(&id).await.expect_err("deleted");
    assert_eq!(error.status(), Some(404));
    assert_eq!(error.message(), "Course not found");
}

#[tokio::test]
async fn validation_failures_carry_the_server_message() {
    let server = start_server().await;

    let error = server
        .client
        .create_shop(&NewShop::default(), &admin())
        .await
        .expect_err("name missing");

    assert!(matches!(error, ClientError::Api { status: 400, .. }));
    assert_eq!(error.message(), "Validation failed: name is required");
}

#[tokio::test]
async fn event_round_trip_with_image() {
    let server = start_server().await;
    let client = &server.client;

    let created = client
        .create_event(
            &workshop_form(),
            Some(ImageUpload::new("poster.jpg", b"jpeg bytes".to_vec())),
            &admin(),
        )
        .await
        .expect("create succeeds");
    let id = created.id.to_string();
    let image = created.fields.image.clone().expect("image stored");

    let updated = client
        .update_event(
            &id,
            &EventForm::default().with("allocatedSeats", "20"),
            None,
            &admin(),
        )
        .await
        .expect("update succeeds");
    assert_eq!(u32::from(updated.fields.allocated_seats), 20);
    assert_eq!(updated.fields.image, Some(image));
    assert_eq!(updated.fields.title, created.fields.title);

    let message = client.delete_event(&id, &admin()).await.expect("delete succeeds");
    assert_eq!(message, "Event deleted successfully");
    assert!(client.list_events().await.expect("list succeeds").is_empty());
}

#[tokio::test]
async fn ids_cannot_reach_another_resource() {
    let server = start_server().await;
    let client = &server.client;
    let event = client
        .create_event(&workshop_form(), None, &admin())
        .await
        .expect("create succeeds");
    let smuggled = format!("../events/{}", event.id);

    let error = client
        .delete_shop(&smuggled, &admin())
        .await
        .expect_err("not a shop id");

    assert_eq!(error.status(), Some(400));
    assert_eq!(error.message(), format!("Invalid id: {smuggled}"));
    let still_there = client
        .get_event(&event.id.to_string())
        .await
        .expect("event untouched");
    assert_eq!(still_there, event);
}

#[tokio::test]
async fn mutations_with_a_bad_token_are_unauthorized() {
    let server = start_server().await;

    let error = server
        .client
        .create_event(&workshop_form(), None, &Credentials::bearer("wrong"))
        .await
        .expect_err("token rejected");

    assert_eq!(error.status(), Some(401));
    assert_eq!(error.message(), "Not authorized, token failed");
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let server = start_server().await;

    let error = server
        .client
        .get_event(&EntityId::generate().to_string())
        .await
        .expect_err("nothing stored");

    assert_eq!(error.message(), "Event not found");
}

#[tokio::test]
async fn health_reports_a_reachable_server() {
    let server = start_server().await;

    assert!(server.client.health().await.expect("request succeeds"));
}
