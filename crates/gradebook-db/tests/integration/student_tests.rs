use gradebook_core::error::AppError;
use gradebook_core::models::{Group, NewStudent, Role, StudentUpdate};
use gradebook_core::traits::CredentialStore;

use crate::integration::common::{count_users, seed_catalog, setup_test_db, user_status};

fn new_student(id: &str, group_id: i32) -> NewStudent {
    NewStudent {
        student_id: id.into(),
        firstname: "Ada".into(),
        surname: "Lovelace".into(),
        password_hash: "$argon2id$v=19$fake".into(),
        group_id,
    }
}

#[tokio::test]
async fn create_and_get_student() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;
    let repo = db.student_repo();

    let created = repo.create(&new_student("s1", 1)).await.unwrap();
    assert_eq!(created.student_id, "s1");

    let fetched = repo.get("s1").await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.firstname, "Ada");
    assert_eq!(fetched.surname, "Lovelace");
    assert_eq!(fetched.group_id, 1);

    let credential = db.user_repo().find_credential("s1").await.unwrap().unwrap();
    assert_eq!(credential.role, Role::User);
    assert_eq!(credential.password_hash, "$argon2id$v=19$fake");
}

#[tokio::test]
async fn create_increments_occupancy_by_one() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 3 }).await;

    let before = db.catalog_repo().occupancy(1).await.unwrap().unwrap();
    assert_eq!(before.students, 0);

    db.student_repo().create(&new_student("s1", 1)).await.unwrap();

    let after = db.catalog_repo().occupancy(1).await.unwrap().unwrap();
    assert_eq!(after.students, 1);
}

#[tokio::test]
async fn full_group_rejects_without_writing() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 2 }).await;
    let repo = db.student_repo();

    repo.create(&new_student("s1", 1)).await.unwrap();
    repo.create(&new_student("s2", 1)).await.unwrap();

    let err = repo.create(&new_student("s3", 1)).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::CapacityConflict {
            group_id: 1,
            quantity: 2
        }
    ));

    assert!(!repo.exists("s3").await.unwrap());
    assert_eq!(count_users(db.pool(), "s3").await, 0);
    assert_eq!(db.catalog_repo().occupancy(1).await.unwrap().unwrap().students, 2);
}

#[tokio::test]
async fn concurrent_enrolments_respect_capacity() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 2 }).await;

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let repo = db.student_repo();
            tokio::spawn(async move { repo.create(&new_student(&format!("s{i}"), 1)).await })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) => assert!(
                matches!(err, AppError::CapacityConflict { group_id: 1, quantity: 2 }),
                "unexpected error: {err}"
            ),
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(db.catalog_repo().occupancy(1).await.unwrap().unwrap().students, 2);
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(users, 2);
}

#[tokio::test]
async fn unknown_group_is_not_found() {
    let (db, _container) = setup_test_db().await;

    let err = db.student_repo().create(&new_student("s1", 9)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(count_users(db.pool(), "s1").await, 0);
}

#[tokio::test]
async fn duplicate_username_rolls_back() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;
    let repo = db.student_repo();

    repo.create(&new_student("s1", 1)).await.unwrap();
    let err = repo.create(&new_student("s1", 1)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(db.catalog_repo().occupancy(1).await.unwrap().unwrap().students, 1);
}

#[tokio::test]
async fn rename_updates_credential_row() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;
    let repo = db.student_repo();
    repo.create(&new_student("s1", 1)).await.unwrap();

    let update = StudentUpdate {
        student_id: "s1-renamed".into(),
        firstname: "Grace".into(),
        surname: "Hopper".into(),
        password_hash: "$argon2id$v=19$other".into(),
    };
    let updated = repo.update("s1", &update).await.unwrap();
    assert_eq!(updated.student_id, "s1-renamed");
    assert_eq!(updated.group_id, 1);

    assert!(!repo.exists("s1").await.unwrap());
    assert_eq!(count_users(db.pool(), "s1").await, 0);

    let credential = db
        .user_repo()
        .find("s1-renamed")
        .await
        .unwrap()
        .expect("credential should follow the rename");
    assert_eq!(credential.password_hash, "$argon2id$v=19$other");
}

#[tokio::test]
async fn rename_onto_existing_user_changes_nothing() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;
    let repo = db.student_repo();
    repo.create(&new_student("s1", 1)).await.unwrap();
    repo.create(&new_student("s2", 1)).await.unwrap();

    let update = StudentUpdate {
        student_id: "s2".into(),
        firstname: "X".into(),
        surname: "Y".into(),
        password_hash: "h".into(),
    };
    let err = repo.update("s1", &update).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let untouched = repo.get("s1").await.unwrap();
    assert_eq!(untouched.firstname, "Ada");
}

#[tokio::test]
async fn delete_removes_student_and_credential() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;
    let repo = db.student_repo();
    repo.create(&new_student("s1", 1)).await.unwrap();

    repo.delete("s1").await.unwrap();

    assert!(matches!(repo.get("s1").await, Err(AppError::NotFound(_))));
    assert_eq!(user_status(db.pool(), "s1").await, None);

    let err = repo.delete("s1").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
