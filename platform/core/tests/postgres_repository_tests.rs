// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! PostgreSQL repository tests.
//!
//! Ignored by default. Run against a disposable database with
//! `DATABASE_URL=postgres://… cargo test -p cheongwon-core --test postgres_repository_tests -- --ignored`.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, Utc};

use cheongwon_core::application::repository_factory::{create_postgres_repositories, Repositories};
use cheongwon_core::domain::petition::{NewPetition, Petition, PetitionStatus};
use cheongwon_core::domain::policy::SubmissionPolicy;
use cheongwon_core::domain::repository::{PostgresConfig, RepositoryError};
use cheongwon_core::domain::user::{NewUser, Role, User, UserStatus};
use cheongwon_core::infrastructure::db::Database;

static SEQ: AtomicUsize = AtomicUsize::new(0);

async fn connect() -> Option<Repositories> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set; skipping");
            return None;
        }
    };
    let database = Database::new(&PostgresConfig {
        connection_string: url,
        max_connections: 16,
    })
    .await
    .unwrap();
    database.migrate().await.unwrap();
    Some(create_postgres_repositories(database.get_pool().clone()))
}

fn unique_email(tag: &str) -> String {
    format!(
        "{}-{}-{}@hufs.ac.kr",
        tag,
        Utc::now().timestamp_micros(),
        SEQ.fetch_add(1, Ordering::SeqCst)
    )
}

async fn user(repos: &Repositories, tag: &str) -> User {
    repos
        .users
        .insert(&NewUser {
            email: unique_email(tag),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            status: UserStatus::Active,
            role: Role::User,
            created_at: Utc::now(),
        })
        .await
        .unwrap()
}

fn draft(owner: &User, title: &str, now: DateTime<Utc>) -> NewPetition {
    NewPetition::new(
        owner.id,
        title,
        "campus",
        "Keep the reading room open overnight.",
        vec!["https://library.hufs.ac.kr".to_string()],
        now,
    )
    .unwrap()
}

async fn petition(repos: &Repositories, owner: &User) -> Petition {
    let now = Utc::now();
    repos
        .petitions
        .insert(&draft(owner, "Reading room", now), SubmissionPolicy::default().cutoff(now))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_distinct_agreements_all_count() {
    let Some(repos) = connect().await else { return };
    let owner = user(&repos, "owner").await;
    let target = petition(&repos, &owner).await;

    let mut voters = Vec::new();
    for _ in 0..12 {
        voters.push(user(&repos, "voter").await.id);
    }

    let handles: Vec<_> = voters
        .into_iter()
        .map(|voter| {
            let agreements = repos.agreements.clone();
            tokio::spawn(async move { agreements.create(voter, target.id, Utc::now()).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = repos.petitions.find_by_id(target.id).await.unwrap().unwrap();
    assert_eq!(stored.agree_count, 12);
    assert_eq!(repos.agreements.count_by_petition(target.id).await.unwrap(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_duplicate_agreements_conflict() {
    let Some(repos) = connect().await else { return };
    let owner = user(&repos, "owner").await;
    let voter = user(&repos, "voter").await;
    let target = petition(&repos, &owner).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let agreements = repos.agreements.clone();
            tokio::spawn(async move { agreements.create(voter.id, target.id, Utc::now()).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert!(matches!(e, RepositoryError::Conflict(_)), "unexpected error: {e}"),
        }
    }

    assert_eq!(succeeded, 1);
    let stored = repos.petitions.find_by_id(target.id).await.unwrap().unwrap();
    assert_eq!(stored.agree_count, 1);
}

#[tokio::test]
#[ignore]
async fn test_agreement_after_status_change_rolls_back() {
    let Some(repos) = connect().await else { return };
    let owner = user(&repos, "owner").await;
    let voter = user(&repos, "voter").await;
    let target = petition(&repos, &owner).await;

    repos
        .petitions
        .update_status(target.id, PetitionStatus::Closed)
        .await
        .unwrap()
        .unwrap();

    let err = repos.agreements.create(voter.id, target.id, Utc::now()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::StaleState(_)));
    assert!(!repos.agreements.exists(voter.id, target.id).await.unwrap());
    assert_eq!(repos.agreements.count_by_petition(target.id).await.unwrap(), 0);

    let stored = repos.petitions.find_by_id(target.id).await.unwrap().unwrap();
    assert_eq!(stored.agree_count, 0);
    assert_eq!(stored.status, PetitionStatus::Closed);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_report_conflicts() {
    let Some(repos) = connect().await else { return };
    let owner = user(&repos, "owner").await;
    let reporter = user(&repos, "reporter").await;
    let target = petition(&repos, &owner).await;

    repos.reports.create(reporter.id, target.id, Utc::now()).await.unwrap();
    let err = repos.reports.create(reporter.id, target.id, Utc::now()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert!(repos.reports.exists(reporter.id, target.id).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_submissions_insert_one_petition() {
    let Some(repos) = connect().await else { return };
    let owner = user(&repos, "owner").await;
    let now = Utc::now();
    let cutoff = SubmissionPolicy::default().cutoff(now);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let petitions = repos.petitions.clone();
            let new_petition = draft(&owner, &format!("Burst {}", i), now);
            tokio::spawn(async move { petitions.insert(&new_petition, cutoff).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert!(matches!(e, RepositoryError::Conflict(_)), "unexpected error: {e}"),
        }
    }
    assert_eq!(succeeded, 1);

    let later = now + Duration::hours(1);
    let err = repos
        .petitions
        .insert(&draft(&owner, "Too soon", later), SubmissionPolicy::default().cutoff(later))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn test_withdrawal_decrements_agreement_counts() {
    let Some(repos) = connect().await else { return };
    let owner = user(&repos, "owner").await;
    let voter = user(&repos, "voter").await;
    let first = petition(&repos, &owner).await;
    let other_owner = user(&repos, "owner").await;
    let second = petition(&repos, &other_owner).await;

    repos.agreements.create(voter.id, first.id, Utc::now()).await.unwrap();
    repos.agreements.create(voter.id, second.id, Utc::now()).await.unwrap();

    assert!(repos.users.delete_by_email(&voter.email).await.unwrap());
    assert!(!repos.users.exists_by_email(&voter.email).await.unwrap());

    for id in [first.id, second.id] {
        let stored = repos.petitions.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.agree_count, 0);
        assert_eq!(repos.agreements.count_by_petition(id).await.unwrap(), 0);
    }

    // Withdrawing an author removes their petitions.
    assert!(repos.users.delete_by_email(&owner.email).await.unwrap());
    assert!(repos.petitions.find_by_id(first.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_conflicts() {
    let Some(repos) = connect().await else { return };
    let existing = user(&repos, "taken").await;

    let err = repos
        .users
        .insert(&NewUser {
            email: existing.email.clone(),
            password_hash: existing.password_hash.clone(),
            status: UserStatus::Active,
            role: Role::User,
            created_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}
