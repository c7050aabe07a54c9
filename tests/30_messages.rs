mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tripshare_api::auth;

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[tokio::test]
async fn conversation_round_trip() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let base = common::unique_id_base();
    let (u1, u2) = (base, base + 1);
    common::seed_user(u1, &format!("sender_{}", base)).await?;
    common::seed_user(u2, &format!("receiver_{}", base)).await?;
    let token_1 = auth::issue_token(u1, false)?;
    let token_2 = auth::issue_token(u2, false)?;

    // u1 sends "hi" to u2: conversation id is bound to (to, from) order
    let res = client
        .post(format!("{}/messages/create", server.base_url))
        .header("Authorization", bearer(&token_1))
        .json(&json!({"msg_txt": "hi", "to_user_id": u2, "from_user_id": u1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let created = &body["data"];
    assert_eq!(created["msg_txt"], "hi");
    assert_eq!(created["to_user_id"], u2);
    assert_eq!(created["from_user_id"], u1);
    assert_eq!(created["conversation_id"], format!("{}-{}", u2, u1));
    let msg_id = created["id"].as_i64().unwrap();

    // u2 replies, producing the opposite conversation id
    let res = client
        .post(format!("{}/messages/create", server.base_url))
        .header("Authorization", bearer(&token_2))
        .json(&json!({"msg_txt": "hey back", "to_user_id": u1, "from_user_id": u2}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["conversation_id"], format!("{}-{}", u1, u2));

    // get(u2, u1): one thread, both directions, oldest first
    let res = client
        .get(format!("{}/messages/{}/{}", server.base_url, u2, u1))
        .header("Authorization", bearer(&token_1))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let messages = body["data"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["msg_txt"], "hi");
    assert_eq!(messages[1]["msg_txt"], "hey back");

    // retrieval is symmetric: get(u1, u2) returns the same set
    let res = client
        .get(format!("{}/messages/{}/{}", server.base_url, u1, u2))
        .header("Authorization", bearer(&token_2))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let mirrored = body["data"].as_array().unwrap();
    assert_eq!(mirrored.len(), 2);
    assert_eq!(mirrored[0]["id"], messages[0]["id"]);
    assert_eq!(mirrored[1]["id"], messages[1]["id"]);

    // edit the first message (ownership target comes from the body)
    let res = client
        .patch(format!("{}/messages/edit/{}", server.base_url, msg_id))
        .header("Authorization", bearer(&token_1))
        .json(&json!({"user_id": u1, "new_msg_txt": "hi there"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["msg_txt"], "hi there");

    // a different non-admin user cannot delete it
    let res = client
        .delete(format!("{}/messages/delete/{}", server.base_url, msg_id))
        .header("Authorization", bearer(&token_2))
        .json(&json!({"user_id": u1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // the owner can
    let res = client
        .delete(format!("{}/messages/delete/{}", server.base_url, msg_id))
        .header("Authorization", bearer(&token_1))
        .json(&json!({"user_id": u1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // deleting again is NotFound
    let res = client
        .delete(format!("{}/messages/delete/{}", server.base_url, msg_id))
        .header("Authorization", bearer(&token_1))
        .json(&json!({"user_id": u1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    common::cleanup_users(&[u1, u2]).await?;
    Ok(())
}

#[tokio::test]
async fn message_validation_rules() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let base = common::unique_id_base();
    let (u1, u2) = (base, base + 1);
    common::seed_user(u1, &format!("val_a_{}", base)).await?;
    common::seed_user(u2, &format!("val_b_{}", base)).await?;
    let token_1 = auth::issue_token(u1, false)?;

    // over-length text is rejected upstream of the conversation service
    let res = client
        .post(format!("{}/messages/create", server.base_url))
        .header("Authorization", bearer(&token_1))
        .json(&json!({"msg_txt": "a".repeat(351), "to_user_id": u2, "from_user_id": u1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // exactly 350 characters is fine
    let res = client
        .post(format!("{}/messages/create", server.base_url))
        .header("Authorization", bearer(&token_1))
        .json(&json!({"msg_txt": "a".repeat(350), "to_user_id": u2, "from_user_id": u1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    // self-messages are malformed input
    let res = client
        .post(format!("{}/messages/create", server.base_url))
        .header("Authorization", bearer(&token_1))
        .json(&json!({"msg_txt": "note to self", "to_user_id": u1, "from_user_id": u1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // a message to a non-existent user surfaces as NotFound
    let res = client
        .post(format!("{}/messages/create", server.base_url))
        .header("Authorization", bearer(&token_1))
        .json(&json!({"msg_txt": "anyone there?", "to_user_id": base + 999, "from_user_id": u1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    common::cleanup_users(&[u1, u2]).await?;
    Ok(())
}
