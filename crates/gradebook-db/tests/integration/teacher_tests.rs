use chrono::NaiveDate;
use gradebook_core::error::AppError;
use gradebook_core::models::{Group, Mark, NewStudent, NewTeacher, Role};

use crate::integration::common::{count_users, seed_catalog, setup_test_db, user_status};

fn new_teacher(id: &str, subject_id: i32) -> NewTeacher {
    NewTeacher {
        teacher_id: id.into(),
        firstname: "Alan".into(),
        surname: "Turing".into(),
        password_hash: "$argon2id$v=19$fake".into(),
        subject_id,
    }
}

#[tokio::test]
async fn create_teacher_with_admin_credential() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;

    let teacher = db.teacher_repo().create(&new_teacher("t1", 1)).await.unwrap();
    assert_eq!(teacher.subject_id, 1);

    let credential = db.user_repo().find("t1").await.unwrap().unwrap();
    assert_eq!(credential.role, Role::Admin);
}

#[tokio::test]
async fn unknown_subject_writes_nothing() {
    let (db, _container) = setup_test_db().await;

    let err = db.teacher_repo().create(&new_teacher("t1", 42)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(count_users(db.pool(), "t1").await, 0);
}

#[tokio::test]
async fn list_and_filter_by_subject() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;
    db.catalog_repo().create_subject(2).await.unwrap();
    let repo = db.teacher_repo();

    repo.create(&new_teacher("t2", 2)).await.unwrap();
    repo.create(&new_teacher("t1", 1)).await.unwrap();
    repo.create(&new_teacher("t3", 1)).await.unwrap();

    let all: Vec<String> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.teacher_id)
        .collect();
    assert_eq!(all, vec!["t1", "t2", "t3"]);

    let maths: Vec<String> = repo
        .list_by_subject(1)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.teacher_id)
        .collect();
    assert_eq!(maths, vec!["t1", "t3"]);

    assert!(repo.list_by_subject(7).await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_cascades_to_credential_and_marks() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;
    db.teacher_repo().create(&new_teacher("t1", 1)).await.unwrap();
    db.student_repo()
        .create(&NewStudent {
            student_id: "s1".into(),
            firstname: "A".into(),
            surname: "B".into(),
            password_hash: "h".into(),
            group_id: 1,
        })
        .await
        .unwrap();
    db.mark_repo()
        .create(&Mark {
            mark_id: 1,
            student_id: "s1".into(),
            subject_id: 1,
            teacher_id: "t1".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            value: 5,
        })
        .await
        .unwrap();

    let mut update = new_teacher("t1-new", 1);
    update.surname = "Kay".into();
    let updated = db.teacher_repo().update("t1", &update).await.unwrap();
    assert_eq!(updated.teacher_id, "t1-new");
    assert_eq!(updated.surname, "Kay");

    assert_eq!(user_status(db.pool(), "t1").await, None);
    assert_eq!(user_status(db.pool(), "t1-new").await.as_deref(), Some("admin"));

    let marks = db.mark_repo().list_for_student("s1").await.unwrap();
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].teacher_id, "t1-new");
}

#[tokio::test]
async fn delete_teacher() {
    let (db, _container) = setup_test_db().await;
    seed_catalog(&db, 1, Group { group_id: 1, quantity: 30 }).await;
    let repo = db.teacher_repo();
    repo.create(&new_teacher("t1", 1)).await.unwrap();

    repo.delete("t1").await.unwrap();
    assert!(matches!(repo.get("t1").await, Err(AppError::NotFound(_))));
    assert_eq!(count_users(db.pool(), "t1").await, 0);

    assert!(matches!(repo.delete("t1").await, Err(AppError::NotFound(_))));
}
