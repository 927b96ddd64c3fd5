//! Concurrency test: parallel reviews and submissions.
//!
//! Validates that the compare-and-swap review transition and the status
//! recompute stay consistent under contention, for both record stores.

use std::sync::{Arc, Barrier};
use std::thread;

use kyc_review::{
    Decision, DocumentId, DocumentStatus, DocumentType, FileStore, KycConfig, KycError,
    KycService, MemoryBlobStore, MemoryStore, RecordStore, ReviewerId, Upload, UserId,
    VerificationStatus,
};

fn service_over(store: Arc<dyn RecordStore>) -> KycService {
    KycService::new(KycConfig::default(), store, Arc::new(MemoryBlobStore::new()))
}

fn scan(document_type: DocumentType, i: usize) -> Upload {
    Upload::new(document_type, format!("scan-{i}.pdf"), "application/pdf", vec![7; 32])
}

/// Race `threads` reviewers on one pending document and return the number
/// of winners and conflicts.
fn race_on_one_document(service: &KycService, threads: usize) -> (usize, usize, DocumentId) {
    let user = UserId::new("contested");
    let id = service.submit(&user, scan(DocumentType::Passport, 0)).unwrap();
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            let id = id.clone();
            thread::spawn(move || {
                let decision = if i % 2 == 0 {
                    Decision::Approve
                } else {
                    Decision::Reject
                };
                barrier.wait();
                service.decide(
                    &id,
                    &ReviewerId::new(format!("reviewer-{i}")),
                    decision,
                    Some("concurrent review"),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(KycError::Conflict { .. })))
        .count();
    (wins, conflicts, id)
}

#[test]
fn stress_50_reviewers_one_document_memory() {
    let service = service_over(Arc::new(MemoryStore::new()));
    let (wins, conflicts, id) = race_on_one_document(&service, 50);

    assert_eq!(wins, 1, "exactly one reviewer must win");
    assert_eq!(conflicts, 49);

    let record = service.document(&id).unwrap();
    assert!(record.status.is_terminal());
    assert_eq!(service.audit().list_by_document(&id).unwrap().count(), 1);

    let expected = match record.status {
        DocumentStatus::Approved => VerificationStatus::Verified,
        _ => VerificationStatus::Rejected,
    };
    assert_eq!(
        service.profile(&record.user_id).unwrap().verification_status,
        expected
    );
}

#[test]
fn stress_20_reviewers_one_document_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_over(Arc::new(FileStore::open(dir.path()).unwrap()));
    let (wins, conflicts, id) = race_on_one_document(&service, 20);

    assert_eq!(wins, 1);
    assert_eq!(conflicts, 19);
    assert_eq!(service.audit().list_by_document(&id).unwrap().count(), 1);
    assert_eq!(service.audit().verify().unwrap(), 1);

    // A fresh handle on the same directory sees the same outcome.
    let reopened = FileStore::open(dir.path()).unwrap();
    let record = reopened.get_document(&id).unwrap().unwrap();
    assert!(record.status.is_terminal());
    assert_eq!(reopened.audit_entries().unwrap().len(), 1);
}

#[test]
fn stress_independent_handles_on_one_directory() {
    // One service per "process", each with its own store handle.
    let dir = tempfile::tempdir().unwrap();
    let services: Vec<KycService> = (0..8)
        .map(|_| service_over(Arc::new(FileStore::open(dir.path()).unwrap())))
        .collect();
    let user = UserId::new("shared-dir");
    let ids: Vec<DocumentId> = (0..10)
        .map(|i| services[i % 8].submit(&user, scan(DocumentType::Other, i)).unwrap())
        .collect();

    for id in &ids {
        let barrier = Arc::new(Barrier::new(services.len()));
        let handles: Vec<_> = services
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, service)| {
                let barrier = Arc::clone(&barrier);
                let id = id.clone();
                thread::spawn(move || {
                    barrier.wait();
                    service.approve(&id, &ReviewerId::new(format!("worker-{i}")), None)
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(wins, 1, "exactly one handle decides {id}");
    }

    let audit = services[3].audit();
    assert_eq!(audit.verify().unwrap(), ids.len());
    let sequences: Vec<u64> = audit.entries().unwrap().map(|e| e.sequence).collect();
    assert_eq!(sequences, (1..=ids.len() as u64).collect::<Vec<_>>());
    assert_eq!(
        services[5].profile(&user).unwrap().verification_status,
        VerificationStatus::Verified
    );
}

#[test]
fn stress_parallel_decisions_on_sibling_documents() {
    let service = service_over(Arc::new(MemoryStore::new()));
    let user = UserId::new("many-docs");
    let ids: Vec<DocumentId> = (0..32)
        .map(|i| {
            service
                .submit(&user, scan(DocumentType::ALL[i % DocumentType::ALL.len()], i))
                .unwrap()
        })
        .collect();
    assert_eq!(
        service.profile(&user).unwrap().verification_status,
        VerificationStatus::Pending
    );

    let barrier = Arc::new(Barrier::new(ids.len()));
    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, id)| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service
                    .approve(&id, &ReviewerId::new(format!("reviewer-{i}")), None)
                    .expect("each document is decided once");
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // No lost update: the last recompute saw every approval.
    assert_eq!(
        service.profile(&user).unwrap().verification_status,
        VerificationStatus::Verified
    );
    assert_eq!(service.recompute(&user).unwrap(), VerificationStatus::Verified);
    assert_eq!(service.audit().verify().unwrap(), 32);

    // Timestamps follow the sequence even though the reviews raced.
    let entries: Vec<_> = service.audit().entries().unwrap().collect();
    assert!(entries.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[test]
fn stress_parallel_decisions_with_one_rejection() {
    let service = service_over(Arc::new(MemoryStore::new()));
    let user = UserId::new("one-bad-doc");
    let ids: Vec<DocumentId> = (0..16)
        .map(|i| service.submit(&user, scan(DocumentType::Other, i)).unwrap())
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, id)| {
            let service = service.clone();
            thread::spawn(move || {
                let reviewer = ReviewerId::new("admin");
                if i == 7 {
                    service.reject(&id, &reviewer, "tampered scan").unwrap();
                } else {
                    service.approve(&id, &reviewer, None).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(
        service.profile(&user).unwrap().verification_status,
        VerificationStatus::Rejected
    );
}

#[test]
fn stress_concurrent_submissions_and_reviews() {
    let service = service_over(Arc::new(MemoryStore::new()));
    let user = UserId::new("busy");
    let first = service.submit(&user, scan(DocumentType::Passport, 0)).unwrap();

    let submitter = {
        let service = service.clone();
        let user = user.clone();
        thread::spawn(move || {
            (1..=20)
                .map(|i| service.submit(&user, scan(DocumentType::NationalId, i)).unwrap())
                .collect::<Vec<_>>()
        })
    };
    let reviewer = {
        let service = service.clone();
        thread::spawn(move || service.approve(&first, &ReviewerId::new("admin"), None))
    };

    let submitted = submitter.join().unwrap();
    reviewer.join().unwrap().unwrap();
    assert_eq!(submitted.len(), 20);

    // Twenty documents are still pending, so the user is pending whatever
    // the interleaving was.
    assert_eq!(
        service.profile(&user).unwrap().verification_status,
        VerificationStatus::Pending
    );
    assert_eq!(service.documents(&user).unwrap().len(), 21);
}
