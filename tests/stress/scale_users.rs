//! Scale test: many users with several documents each.
//!
//! Validates that listing, counting, filtering and status derivation stay
//! correct across a large population.

use std::sync::Arc;
use std::thread;

use kyc_review::{
    DocumentFilter, DocumentStatus, DocumentType, FileStore, KycConfig, KycService,
    MemoryBlobStore, MemoryStore, ReviewerId, Upload, UserId, VerificationStatus,
};

fn upload(document_type: DocumentType, name: String) -> Upload {
    Upload::new(document_type, name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

/// Outcome assigned to user `u`: approve all, reject one, or leave pending.
fn expected_status(u: usize) -> VerificationStatus {
    match u % 3 {
        0 => VerificationStatus::Verified,
        1 => VerificationStatus::Rejected,
        _ => VerificationStatus::Pending,
    }
}

fn populate(service: &KycService, users: usize) {
    let admin = ReviewerId::new("admin");
    for u in 0..users {
        let user = UserId::new(format!("user-{u:04}"));
        let passport = service
            .submit(&user, upload(DocumentType::Passport, format!("passport-{u}.jpg")))
            .unwrap();
        let address = service
            .submit(&user, upload(DocumentType::ProofOfAddress, format!("bill-{u}.jpg")))
            .unwrap();
        match u % 3 {
            0 => {
                service.approve(&passport, &admin, None).unwrap();
                service.approve(&address, &admin, None).unwrap();
            }
            1 => {
                service.approve(&passport, &admin, None).unwrap();
                service.reject(&address, &admin, "address unreadable").unwrap();
            }
            _ => {
                service.approve(&passport, &admin, None).unwrap();
            }
        }
    }
}

#[test]
fn stress_1k_users_status_and_counts() {
    let service = KycService::new(
        KycConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryBlobStore::new()),
    );
    populate(&service, 1_000);

    for u in 0..1_000 {
        let user = UserId::new(format!("user-{u:04}"));
        assert_eq!(
            service.profile(&user).unwrap().verification_status,
            expected_status(u),
            "user {u}"
        );
        assert_eq!(service.documents(&user).unwrap().len(), 2);
    }

    let counts = service.counts().unwrap();
    assert_eq!(counts.total(), 2_000);
    assert_eq!(counts.rejected, 333);
    assert_eq!(counts.pending, 333);
    assert_eq!(counts.approved, 2_000 - 333 - 333);

    let pending = service
        .review_queue(&DocumentFilter::status(DocumentStatus::Pending))
        .unwrap();
    assert_eq!(pending.len(), 333);
    assert!(pending
        .windows(2)
        .all(|w| w[0].created_at > w[1].created_at));

    let hits = service
        .review_queue(&DocumentFilter {
            search: Some("USER-0042".into()),
            ..DocumentFilter::default()
        })
        .unwrap();
    assert_eq!(hits.len(), 2);

    assert_eq!(service.audit().verify().unwrap(), 2_000 - 333);
}

#[test]
fn stress_100_users_on_disk_from_8_threads() {
    let dir = tempfile::tempdir().unwrap();
    let service = KycService::new(
        KycConfig::default(),
        Arc::new(FileStore::open(dir.path()).unwrap()),
        Arc::new(MemoryBlobStore::new()),
    );

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let service = service.clone();
            thread::spawn(move || {
                let admin = ReviewerId::new(format!("admin-{t}"));
                for u in (t..100).step_by(8) {
                    let user = UserId::new(format!("user-{u:04}"));
                    let id = service
                        .submit(&user, upload(DocumentType::NationalId, format!("id-{u}.jpg")))
                        .unwrap();
                    service.approve(&id, &admin, None).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(service.counts().unwrap().approved, 100);
    for u in 0..100 {
        let user = UserId::new(format!("user-{u:04}"));
        assert_eq!(
            service.profile(&user).unwrap().verification_status,
            VerificationStatus::Verified
        );
    }
    assert_eq!(service.audit().verify().unwrap(), 100);
}
