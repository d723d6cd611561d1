//! End-to-end invite, farm permission and outbox flows through the binary

mod common;

use common::{create_account, create_worker, error_body, json, json_as, setup_workspace};

// ============================================================================
// Worker invites
// ============================================================================

#[test]
fn test_worker_accepts_invite() {
    let tmp = setup_workspace();
    let applicator = create_account(&tmp, "ops@example.com", "applicator");

    let created = create_worker(&tmp, applicator, "zed@example.com", "Zed");
    assert_eq!(created["inviteStatus"], "PENDING");
    assert_eq!(created["percentageFee"], 10.0);
    let worker = created["id"].as_i64().unwrap();

    let pending = json_as(&tmp, worker, &["worker", "pending"]);
    assert_eq!(pending["totalResults"], 1);
    assert_eq!(pending["result"][0]["id"], applicator);

    let answered = json_as(
        &tmp,
        worker,
        &["worker", "respond", &applicator.to_string(), "accept"],
    );
    assert_eq!(answered["inviteStatus"], "ACCEPTED");

    let workers = json_as(&tmp, applicator, &["worker", "list"]);
    assert_eq!(workers["totalResults"], 1);
    assert_eq!(workers["result"][0]["inviteStatus"], "ACCEPTED");

    // the applicator hears about the answer
    let inbox = json_as(&tmp, applicator, &["notify", "list", "--unread"]);
    assert_eq!(inbox["totalResults"], 1);
}

#[test]
fn test_worker_list_search_is_scoped_to_applicator() {
    let tmp = setup_workspace();
    let first = create_account(&tmp, "first@example.com", "applicator");
    let second = create_account(&tmp, "second@example.com", "applicator");

    create_worker(&tmp, first, "zed@example.com", "Zed");
    create_worker(&tmp, first, "amy@example.com", "Amy");
    create_worker(&tmp, second, "zoe@example.com", "Zoe");

    let found = json_as(&tmp, first, &["worker", "list", "-l", "firstName", "-s", "z"]);
    assert_eq!(found["totalResults"], 1);
    assert_eq!(found["result"][0]["email"], "zed@example.com");

    let everyone = json_as(&tmp, first, &["worker", "list", "-s", "example.com"]);
    assert_eq!(everyone["totalResults"], 2);
}

#[test]
fn test_invite_token_accepts_without_caller() {
    let tmp = setup_workspace();
    let applicator = create_account(&tmp, "ops@example.com", "applicator");

    let created = create_worker(&tmp, applicator, "zed@example.com", "Zed");
    let token = created["inviteToken"].as_str().unwrap().to_string();

    let accepted = json(&tmp, &["invite", "accept", "--token", &token]);
    assert_eq!(accepted["inviteStatus"], "ACCEPTED");

    // tokens are single use
    let body = error_body(&tmp, None, &["invite", "accept", "--token", &token]);
    assert_eq!(body["code"], 401);
}

#[test]
fn test_tampered_token_is_rejected() {
    let tmp = setup_workspace();
    let body = error_body(&tmp, None, &["invite", "accept", "--token", "not-a-token"]);
    assert_eq!(body["code"], 401);
}

#[test]
fn test_grower_cannot_manage_workers() {
    let tmp = setup_workspace();
    let grower = create_account(&tmp, "grower@example.com", "grower");

    let body = error_body(&tmp, Some(grower), &["worker", "list"]);
    assert_eq!(body["code"], 403);
}

#[test]
fn test_pricing_terms_only_for_workers() {
    let tmp = setup_workspace();
    let applicator = create_account(&tmp, "ops@example.com", "applicator");
    let grower = create_account(&tmp, "grower@example.com", "grower");

    common::agrilink(&tmp)
        .args([
            "--as",
            &applicator.to_string(),
            "grower",
            "invite",
            &grower.to_string(),
        ])
        .assert()
        .success();

    common::agrilink(&tmp)
        .args([
            "--as",
            &applicator.to_string(),
            "app-user",
            "invite",
            &grower.to_string(),
            "--percentage-fee",
            "5",
        ])
        .assert()
        .failure();
}

// ============================================================================
// Applicator users act for their applicator
// ============================================================================

#[test]
fn test_accepted_member_acts_for_applicator() {
    let tmp = setup_workspace();
    let applicator = create_account(&tmp, "ops@example.com", "applicator");

    let created = json_as(
        &tmp,
        applicator,
        &[
            "app-user",
            "create",
            "--email",
            "desk@example.com",
            "--first-name",
            "Desk",
            "--last-name",
            "Clerk",
            "--permissions",
            "workers,billing",
        ],
    );
    assert_eq!(created["permissions"][1], "billing");
    let member = created["id"].as_i64().unwrap();

    json_as(
        &tmp,
        member,
        &["app-user", "respond", &applicator.to_string(), "accept"],
    );

    let me = json_as(&tmp, member, &["account", "whoami"]);
    assert_eq!(me["id"], applicator);
    assert_eq!(me["actingUserId"], member);
    assert_eq!(me["isDelegated"], true);

    create_worker(&tmp, member, "zed@example.com", "Zed");
    let workers = json_as(&tmp, applicator, &["worker", "list"]);
    assert_eq!(workers["totalResults"], 1);
}

// ============================================================================
// Farms
// ============================================================================

#[test]
fn test_farm_sharing() {
    let tmp = setup_workspace();
    let grower = create_account(&tmp, "grower@example.com", "grower");
    let applicator = create_account(&tmp, "ops@example.com", "applicator");
    let outsider = create_account(&tmp, "other@example.com", "applicator");

    let farm = json_as(
        &tmp,
        grower,
        &["farm", "create", "--name", "North 40", "--state-id", "16", "--county", "Story"],
    );
    assert_eq!(farm["stateCode"], "IA");
    let farm_id = farm["id"].as_i64().unwrap().to_string();

    let grant = json_as(
        &tmp,
        grower,
        &["farm", "permission", "grant", &farm_id, "--applicator", &applicator.to_string()],
    );
    assert_eq!(grant["canView"], true);
    assert_eq!(grant["canEdit"], false);

    let shared = json_as(&tmp, applicator, &["farm", "list"]);
    assert_eq!(shared["totalResults"], 1);
    assert_eq!(shared["result"][0]["name"], "North 40");

    let body = error_body(&tmp, Some(outsider), &["farm", "show", &farm_id]);
    assert_eq!(body["code"], 403);

    let body = error_body(
        &tmp,
        Some(grower),
        &["farm", "permission", "grant", &farm_id, "--applicator", &applicator.to_string()],
    );
    assert_eq!(body["code"], 409);

    let body = error_body(
        &tmp,
        Some(grower),
        &["farm", "permission", "grant", "999", "--applicator", &applicator.to_string()],
    );
    assert_eq!(body["code"], 404);
}

// ============================================================================
// Outbox
// ============================================================================

#[test]
fn test_outbox_delivers_invite_mail() {
    let tmp = setup_workspace();
    let admin = create_account(&tmp, "root@example.com", "super-admin");
    let applicator = create_account(&tmp, "ops@example.com", "applicator");
    create_worker(&tmp, applicator, "zed@example.com", "Zed");

    let queued = json_as(&tmp, admin, &["outbox", "list", "--status", "pending"]);
    assert_eq!(queued["totalResults"], 1);
    assert_eq!(queued["result"][0]["recipient"], "zed@example.com");

    let report = json(&tmp, &["outbox", "deliver"]);
    assert_eq!(report["sent"], 1);
    assert_eq!(report["failed"], 0);

    let sent = json_as(&tmp, admin, &["outbox", "list", "--status", "sent"]);
    assert_eq!(sent["totalResults"], 1);

    let again = json(&tmp, &["outbox", "deliver"]);
    assert_eq!(again["sent"], 0);
}
