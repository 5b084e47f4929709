//! Authorization negatives: strangers, read-only contributors and editors
//! who do not own the list

mod support;

use api::ErrorKind;
use api::models::{AccessType, BuyItemRequest, ShareListRequest};
use support::{Caller, TestService, item_request, list_request, register, service};

struct Fixture {
    service: TestService,
    alice: Caller,
    reader: Caller,
    editor: Caller,
    stranger: Caller,
    list_id: i64,
    item_id: i64,
}

/// alice owns a list with one item, shared read-only with `reader` and
/// editable by `editor`
async fn fixture() -> Fixture {
    let service = service();
    let mut alice = register(&service, "alice").await;
    let reader = register(&service, "reader").await;
    let editor = register(&service, "editor").await;
    let stranger = register(&service, "stranger").await;

    let outcome = service
        .create_list(&alice.ctx, list_request("Groceries"))
        .await
        .unwrap();
    let list_id = alice.accept(outcome).id;
    let outcome = service
        .create_item(&alice.ctx, item_request(list_id, "Milk", "Dairy"))
        .await
        .unwrap();
    let item_id = alice.accept(outcome).item.id;

    for (username, access_type) in [("reader", AccessType::ReadOnly), ("editor", AccessType::Edit)] {
        let outcome = service
            .share_list(
                &alice.ctx,
                ShareListRequest {
                    list_id,
                    username: username.to_string(),
                    access_type,
                },
            )
            .await
            .unwrap();
        alice.accept(outcome);
    }

    Fixture {
        service,
        alice,
        reader,
        editor,
        stranger,
        list_id,
        item_id,
    }
}

fn buy(item_id: i64) -> BuyItemRequest {
    BuyItemRequest {
        item_id,
        bought_by: "alice".to_string(),
    }
}

#[tokio::test]
async fn strangers_are_rejected_everywhere() {
    let f = fixture().await;
    let ctx = &f.stranger.ctx;

    let err = f.service.get_list_items(ctx, f.list_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f
        .service
        .create_item(ctx, item_request(f.list_id, "Bread", "Bakery"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f.service.buy_item(ctx, buy(f.item_id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f.service.delete_item(ctx, f.item_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f.service.delete_list(ctx, f.list_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f
        .service
        .share_list(
            ctx,
            ShareListRequest {
                list_id: f.list_id,
                username: "stranger".to_string(),
                access_type: AccessType::Edit,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let outcome = f.service.get_lists(ctx).await.unwrap();
    assert!(outcome.value.is_empty());
}

#[tokio::test]
async fn read_only_contributors_cannot_write() {
    let f = fixture().await;
    let ctx = &f.reader.ctx;

    let outcome = f.service.get_list_items(ctx, f.list_id).await.unwrap();
    assert_eq!(outcome.value.len(), 1);

    let err = f
        .service
        .create_item(ctx, item_request(f.list_id, "Bread", "Bakery"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f.service.buy_item(ctx, buy(f.item_id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f.service.delete_item(ctx, f.item_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f.service.delete_list(ctx, f.list_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn editors_who_do_not_own_the_list_cannot_share_it() {
    let f = fixture().await;

    let err = f
        .service
        .share_list(
            &f.editor.ctx,
            ShareListRequest {
                list_id: f.list_id,
                username: "stranger".to_string(),
                access_type: AccessType::ReadOnly,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let outcome = f.service.buy_item(&f.editor.ctx, buy(f.item_id)).await.unwrap();
    assert_eq!(outcome.value.last_modified_by, f.editor.user_id);
}

#[tokio::test]
async fn share_targets_must_exist_and_cannot_be_the_owner() {
    let f = fixture().await;

    let err = f
        .service
        .share_list(
            &f.alice.ctx,
            ShareListRequest {
                list_id: f.list_id,
                username: "nobody".to_string(),
                access_type: AccessType::ReadOnly,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = f
        .service
        .share_list(
            &f.alice.ctx,
            ShareListRequest {
                list_id: f.list_id,
                username: "alice".to_string(),
                access_type: AccessType::ReadOnly,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn unknown_lists_look_like_forbidden_ones() {
    let f = fixture().await;

    let err = f.service.get_list_items(&f.alice.ctx, 9_999).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = f
        .service
        .share_list(
            &f.alice.ctx,
            ShareListRequest {
                list_id: 9_999,
                username: "reader".to_string(),
                access_type: AccessType::ReadOnly,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
