mod common;

use axum::http::StatusCode;
use common::{app, Client};
use serde_json::json;

#[tokio::test]
async fn current_user_requires_session() {
    let app = app();
    let mut anon = Client::new(&app);
    let reply = anon.send("GET", "/api/auth/user", None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["code"], "unauthenticated");
}

#[tokio::test]
async fn register_then_login_and_duplicate_email() {
    let app = app();
    let mut alice = Client::new(&app);
    let id = alice.register("Alice@Example.com", "Alice").await;
    assert!(alice.has_session());

    let me = alice.send("GET", "/api/auth/user", None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["id"], id.as_str());
    assert_eq!(me.json()["email"], "alice@example.com");

    let mut other = Client::new(&app);
    let dup = other
        .send(
            "POST",
            "/api/auth/register",
            Some(json!({
                "email": "alice@example.com",
                "password": "another-password",
                "firstName": "Eve",
                "lastName": "Imposter",
            })),
        )
        .await;
    assert_eq!(dup.status, StatusCode::BAD_REQUEST);
    assert_eq!(dup.json()["code"], "email_taken");

    let wrong = other
        .send(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "alice@example.com", "password": "another-password" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let ok = other
        .send(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "alice@example.com", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.json()["id"], id.as_str());

    let missing = Client::new(&app)
        .send("POST", "/api/auth/login", Some(json!({ "email": "alice@example.com" })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_clears_session() {
    let app = app();
    let mut alice = Client::new(&app);
    alice.register("alice@example.com", "Alice").await;
    let reply = alice.send("POST", "/api/auth/logout", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let me = alice.send("GET", "/api/auth/user", None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn family_membership_rules() {
    let app = app();
    let mut alice = Client::new(&app);
    alice.register("alice@example.com", "Alice").await;
    let mut bob = Client::new(&app);
    let bob_id = bob.register("bob@example.com", "Bob").await;

    let family_id = alice.create_family("Smiths").await;
    let families = alice.send("GET", "/api/families", None).await.json();
    assert_eq!(families.as_array().map(Vec::len), Some(1));
    assert_eq!(families[0]["role"], "admin");
    assert_eq!(families[0]["family"]["name"], "Smiths");

    let family_uri = format!("/api/families/{family_id}");
    let outsider = bob.send("GET", &family_uri, None).await;
    assert_eq!(outsider.status, StatusCode::UNAUTHORIZED);

    let missing = bob
        .send("GET", "/api/families/00000000-0000-0000-0000-000000000000", None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    // Joining as admin is not allowed without already being an admin.
    let members_uri = format!("{family_uri}/members");
    let promote = bob
        .send("POST", &members_uri, Some(json!({ "userId": bob_id, "role": "admin" })))
        .await;
    assert_eq!(promote.status, StatusCode::UNAUTHORIZED);

    let joined = bob
        .send("POST", &members_uri, Some(json!({ "userId": bob_id })))
        .await;
    assert_eq!(joined.status, StatusCode::CREATED);
    assert_eq!(joined.json()["role"], "member");

    let again = bob
        .send("POST", &members_uri, Some(json!({ "userId": bob_id })))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let detail = bob.send("GET", &family_uri, None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.json()["members"].as_array().map(Vec::len), Some(2));

    let me_uri = format!("{family_uri}/members/me");
    let blocked = alice.send("DELETE", &me_uri, None).await;
    assert_eq!(blocked.status, StatusCode::BAD_REQUEST);
    assert_eq!(blocked.json()["code"], "admin_must_transfer");

    let left = bob.send("DELETE", &me_uri, None).await;
    assert_eq!(left.status, StatusCode::OK);
    let not_member = bob.send("DELETE", &me_uri, None).await;
    assert_eq!(not_member.status, StatusCode::NOT_FOUND);

    let alone = alice.send("DELETE", &me_uri, None).await;
    assert_eq!(alone.status, StatusCode::OK);
    assert_eq!(
        alice.send("GET", "/api/families", None).await.json(),
        json!([])
    );
}

#[tokio::test]
async fn admin_manages_roles() {
    let app = app();
    let mut alice = Client::new(&app);
    let alice_id = alice.register("alice@example.com", "Alice").await;
    let mut bob = Client::new(&app);
    let bob_id = bob.register("bob@example.com", "Bob").await;
    let family_id = alice.create_family("Smiths").await;

    let added = alice
        .send(
            "POST",
            &format!("/api/families/{family_id}/members"),
            Some(json!({ "userId": bob_id })),
        )
        .await;
    assert_eq!(added.status, StatusCode::CREATED);

    let by_member = bob
        .send("DELETE", &format!("/api/families/{family_id}/members/{alice_id}"), None)
        .await;
    assert_eq!(by_member.status, StatusCode::UNAUTHORIZED);

    let demote_self = alice
        .send(
            "PUT",
            &format!("/api/families/{family_id}/members/{alice_id}"),
            Some(json!({ "role": "member" })),
        )
        .await;
    assert_eq!(demote_self.status, StatusCode::BAD_REQUEST);

    let promoted = alice
        .send(
            "PUT",
            &format!("/api/families/{family_id}/members/{bob_id}"),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.json()["role"], "admin");

    let removed = bob
        .send("DELETE", &format!("/api/families/{family_id}/members/{alice_id}"), None)
        .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    let gone = alice.send("GET", &format!("/api/families/{family_id}"), None).await;
    assert_eq!(gone.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn notes_recent_and_public_projection() {
    let app = app();
    let mut alice = Client::new(&app);
    alice.register("alice@example.com", "Alice").await;
    let family_id = alice.create_family("Smiths").await;
    let pet_id = alice.create_pet(&family_id, "Rex").await;

    for day in 1..=8 {
        let reply = alice
            .send(
                "POST",
                "/api/notes",
                Some(json!({
                    "petId": pet_id,
                    "type": "daily",
                    "title": format!("note {day}"),
                    "content": "walked",
                    "date": format!("2024-03-0{day}T09:00:00Z"),
                    "mood": "feliz",
                    "vetName": "Dr. Who",
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let note = reply.json();
        assert_eq!(note["mood"], "feliz");
        assert!(note["vetName"].is_null());
    }

    let recent = alice
        .send("GET", &format!("/api/families/{family_id}/notes/recent?limit=3"), None)
        .await
        .json();
    let titles: Vec<_> = recent
        .as_array()
        .expect("array")
        .iter()
        .map(|n| n["title"].as_str().expect("title").to_string())
        .collect();
    assert_eq!(titles, ["note 8", "note 7", "note 6"]);
    assert_eq!(recent[0]["pet"]["name"], "Rex");
    assert_eq!(recent[0]["author"]["firstName"], "Alice");

    let default_recent = alice
        .send("GET", &format!("/api/families/{family_id}/notes/recent"), None)
        .await
        .json();
    assert_eq!(default_recent.as_array().map(Vec::len), Some(8));

    let mut anon = Client::new(&app);
    let public = anon.send("GET", &format!("/public/pet/{pet_id}"), None).await;
    assert_eq!(public.status, StatusCode::OK);
    let public = public.json();
    assert_eq!(public["pet"]["name"], "Rex");
    assert_eq!(public["notes"].as_array().map(Vec::len), Some(5));
    assert_eq!(public["notes"][0]["title"], "note 8");
    let author = public["notes"][0]["author"].as_object().expect("author");
    assert_eq!(author.get("firstName"), Some(&json!("Alice")));
    assert!(author.get("email").is_none());
    assert!(author.get("provider").is_none());
    assert!(author.get("id").is_none());

    let missing = anon
        .send("GET", "/public/pet/00000000-0000-0000-0000-000000000000", None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pet_resources_require_membership_and_cascade() {
    let app = app();
    let mut alice = Client::new(&app);
    alice.register("alice@example.com", "Alice").await;
    let mut mallory = Client::new(&app);
    mallory.register("mallory@example.com", "Mallory").await;
    let family_id = alice.create_family("Smiths").await;
    let pet_id = alice.create_pet(&family_id, "Rex").await;

    let snoop = mallory.send("GET", &format!("/api/pets/{pet_id}"), None).await;
    assert_eq!(snoop.status, StatusCode::UNAUTHORIZED);

    let note = alice
        .send(
            "POST",
            "/api/notes",
            Some(json!({ "petId": pet_id, "type": "task", "title": "Buy food" })),
        )
        .await;
    assert_eq!(note.status, StatusCode::CREATED);
    let note = note.json();
    assert_eq!(note["frequency"], "once");
    assert_eq!(note["completed"], false);
    let note_id = note["id"].as_str().expect("note id").to_string();

    let done = alice
        .send("PUT", &format!("/api/notes/{note_id}"), Some(json!({ "completed": true })))
        .await;
    assert_eq!(done.status, StatusCode::OK);
    assert_eq!(done.json()["completed"], true);

    let vaccination = alice
        .send(
            "POST",
            "/api/vaccinations",
            Some(json!({
                "petId": pet_id,
                "vaccineName": "Rabies",
                "dateAdministered": "2024-01-10T00:00:00Z",
                "nextDueDate": "2999-01-10T00:00:00Z",
            })),
        )
        .await;
    assert_eq!(vaccination.status, StatusCode::CREATED);
    let vaccination_id = vaccination.json()["id"]
        .as_str()
        .expect("vaccination id")
        .to_string();

    let upcoming = alice
        .send("GET", &format!("/api/families/{family_id}/vaccinations/upcoming"), None)
        .await
        .json();
    assert_eq!(upcoming[0]["vaccineName"], "Rabies");
    assert_eq!(upcoming[0]["pet"]["name"], "Rex");

    let cleared = alice
        .send(
            "PUT",
            &format!("/api/vaccinations/{vaccination_id}"),
            Some(json!({ "nextDueDate": null })),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert!(cleared.json()["nextDueDate"].is_null());
    assert_eq!(cleared.json()["vaccineName"], "Rabies");
    let upcoming = alice
        .send("GET", &format!("/api/families/{family_id}/vaccinations/upcoming"), None)
        .await
        .json();
    assert_eq!(upcoming, json!([]));

    let file = alice
        .send(
            "POST",
            "/api/pet-files",
            Some(json!({
                "petId": pet_id,
                "fileName": "xray.png",
                "fileType": "image/png",
                "filePath": "/api/objects/uploads/0b6f6a2e-8f2d-4c0e-9c57-6d1f3c2b9a10",
            })),
        )
        .await;
    assert_eq!(file.status, StatusCode::CREATED);
    let file = file.json();
    assert_eq!(
        file["filePath"],
        "/objects/uploads/0b6f6a2e-8f2d-4c0e-9c57-6d1f3c2b9a10"
    );
    let file_id = file["id"].as_str().expect("file id").to_string();

    let deleted = alice.send("DELETE", &format!("/api/pets/{pet_id}"), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    for uri in [
        format!("/api/pets/{pet_id}"),
        format!("/api/notes/{note_id}"),
        format!("/api/pet-files/{file_id}"),
    ] {
        let reply = alice.send("GET", &uri, None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{uri}");
    }
    let upcoming = alice
        .send("GET", &format!("/api/families/{family_id}/vaccinations/upcoming"), None)
        .await
        .json();
    assert_eq!(upcoming, json!([]));
}

#[tokio::test]
async fn upload_and_serve_object() {
    let app = app();
    let mut alice = Client::new(&app);
    alice.register("alice@example.com", "Alice").await;

    let ticket = alice.send("POST", "/api/objects/upload", None).await;
    assert_eq!(ticket.status, StatusCode::OK);
    let ticket = ticket.json();
    let upload_url = ticket["uploadURL"].as_str().expect("upload url").to_string();
    let object_path = ticket["objectPath"].as_str().expect("object path").to_string();

    let put = alice
        .send_bytes("PUT", &upload_url, "text/plain", b"vet report")
        .await;
    assert_eq!(put.status, StatusCode::OK);
    assert_eq!(put.json()["objectPath"], object_path.as_str());

    let fetched = alice.send("GET", &object_path, None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.content_type.as_deref(), Some("text/plain"));
    assert_eq!(fetched.bytes, b"vet report");

    let anon = Client::new(&app).send("GET", &object_path, None).await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);

    let missing = alice.send("GET", "/objects/uploads/nothing-here", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn family_invite_qr() {
    let app = app();
    let mut alice = Client::new(&app);
    alice.register("alice@example.com", "Alice").await;
    let family_id = alice.create_family("Smiths").await;

    let reply = alice.send("GET", &format!("/api/families/{family_id}/qr"), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert!(body["qrCode"]
        .as_str()
        .expect("qr code")
        .starts_with("data:image/svg+xml;base64,"));
    assert_eq!(body["inviteData"]["type"], "family-invite");
    assert_eq!(body["inviteData"]["familyId"], family_id.as_str());
    assert_eq!(body["inviteData"]["familyName"], "Smiths");

    let mut bob = Client::new(&app);
    bob.register("bob@example.com", "Bob").await;
    let denied = bob.send("GET", &format!("/api/families/{family_id}/qr"), None).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_backend() {
    let app = app();
    let reply = Client::new(&app).send("GET", "/api/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["backend"], "memory");
}
