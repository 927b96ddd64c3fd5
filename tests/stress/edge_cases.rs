//! Edge case tests: input validation, unknown ids, policy corners,
//! hostile file names, audit tampering and corrupt record files.

use std::sync::Arc;

use kyc_review::{
    DocumentId, DocumentType, FileStore, FsBlobStore, KycConfig, KycError,
    KycService, MemoryBlobStore, MemoryStore, ResubmissionPolicy, ReviewerId, Upload, UserId,
    VerificationStatus,
};

fn memory_service(config: KycConfig) -> KycService {
    KycService::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryBlobStore::new()),
    )
}

fn pdf(document_type: DocumentType, name: &str, size: usize) -> Upload {
    Upload::new(document_type, name, "application/pdf", vec![b'%'; size])
}

// === Validation ===

#[test]
fn edge_blank_user_and_file_name_are_rejected() {
    let service = memory_service(KycConfig::default());

    let err = service
        .submit(&UserId::new("  "), pdf(DocumentType::Passport, "p.pdf", 4))
        .unwrap_err();
    assert!(matches!(err, KycError::Validation(_)));

    let err = service
        .submit(&UserId::new("alice"), pdf(DocumentType::Passport, "", 4))
        .unwrap_err();
    assert!(matches!(err, KycError::Validation(_)));
    assert_eq!(service.counts().unwrap().total(), 0);
}

#[test]
fn edge_size_limit_is_configurable() {
    let service = memory_service(KycConfig {
        max_file_size: 16,
        ..KycConfig::default()
    });
    let user = UserId::new("alice");

    assert!(service.submit(&user, pdf(DocumentType::Passport, "ok.pdf", 16)).is_ok());
    let err = service
        .submit(&user, pdf(DocumentType::Passport, "big.pdf", 17))
        .unwrap_err();
    assert!(matches!(err, KycError::Validation(_)));
    assert!(!err.is_retryable());
}

#[test]
fn edge_unknown_document_type_name() {
    let err = "selfie".parse::<DocumentType>().unwrap_err();
    assert!(matches!(err, KycError::Validation(_)));
    assert_eq!(
        "proof_of_address".parse::<DocumentType>().unwrap(),
        DocumentType::ProofOfAddress
    );
}

#[test]
fn edge_approval_notes_are_optional_and_trimmed() {
    let service = memory_service(KycConfig::default());
    let user = UserId::new("alice");
    let admin = ReviewerId::new("admin");

    let a = service.submit(&user, pdf(DocumentType::Passport, "a.pdf", 4)).unwrap();
    let b = service.submit(&user, pdf(DocumentType::NationalId, "b.pdf", 4)).unwrap();

    let outcome = service.approve(&a, &admin, Some("   ")).unwrap();
    assert_eq!(outcome.document.review_notes, None);

    let outcome = service.reject(&b, &admin, "  glare on photo  ").unwrap();
    assert_eq!(outcome.document.review_notes.as_deref(), Some("glare on photo"));
    assert_eq!(outcome.document.reviewer_id, Some(admin));
}

// === Unknown ids ===

#[test]
fn edge_unknown_ids() {
    let service = memory_service(KycConfig::default());
    let missing = DocumentId("kdoc_doesnotexist".into());

    assert!(matches!(service.document(&missing), Err(KycError::NotFound(_))));
    assert!(matches!(service.download(&missing), Err(KycError::NotFound(_))));
    assert!(matches!(service.purge(&missing), Err(KycError::NotFound(_))));
    assert!(matches!(
        service.approve(&missing, &ReviewerId::new("admin"), None),
        Err(KycError::NotFound(_))
    ));

    let ghost = UserId::new("ghost");
    assert!(service.documents(&ghost).unwrap().is_empty());
    assert_eq!(
        service.profile(&ghost).unwrap().verification_status,
        VerificationStatus::Unverified
    );
    assert_eq!(service.recompute(&ghost).unwrap(), VerificationStatus::Unverified);
    assert_eq!(service.audit().list_by_user(&ghost).unwrap().count(), 0);
}

// === Aggregation corners ===

#[test]
fn edge_rejection_outweighs_any_number_of_approvals() {
    let service = memory_service(KycConfig::default());
    let user = UserId::new("alice");
    let admin = ReviewerId::new("admin");

    let bad = service.submit(&user, pdf(DocumentType::Other, "bad.pdf", 4)).unwrap();
    service.reject(&bad, &admin, "not an identity document").unwrap();
    for (i, t) in [DocumentType::Passport, DocumentType::DriversLicense, DocumentType::NationalId]
        .into_iter()
        .enumerate()
    {
        let id = service.submit(&user, pdf(t, &format!("{i}.pdf"), 4)).unwrap();
        service.approve(&id, &admin, None).unwrap();
    }

    assert_eq!(
        service.profile(&user).unwrap().verification_status,
        VerificationStatus::Rejected
    );
}

#[test]
fn edge_resubmission_of_other_type_does_not_clear_rejection() {
    let service = memory_service(KycConfig {
        resubmission_policy: ResubmissionPolicy::SupersedeByType,
        ..KycConfig::default()
    });
    let user = UserId::new("alice");
    let admin = ReviewerId::new("admin");

    let passport = service.submit(&user, pdf(DocumentType::Passport, "p.pdf", 4)).unwrap();
    service.reject(&passport, &admin, "expired").unwrap();
    let licence = service
        .submit(&user, pdf(DocumentType::DriversLicense, "dl.pdf", 4))
        .unwrap();
    service.approve(&licence, &admin, None).unwrap();

    assert_eq!(
        service.profile(&user).unwrap().verification_status,
        VerificationStatus::Rejected
    );
}

#[test]
fn edge_recompute_is_idempotent() {
    let service = memory_service(KycConfig::default());
    let user = UserId::new("alice");
    service.submit(&user, pdf(DocumentType::Passport, "p.pdf", 4)).unwrap();

    let before = service.profile(&user).unwrap();
    let first = service.recompute(&user).unwrap();
    let second = service.recompute(&user).unwrap();
    assert_eq!(first, second);
    // No transition in between, so the stored profile is untouched.
    assert_eq!(service.profile(&user).unwrap(), before);
}

// === Hostile input on disk ===

#[test]
fn edge_hostile_file_name_stays_inside_blob_dir() {
    let dir = tempfile::tempdir().unwrap();
    let blob_dir = dir.path().join("blobs");
    let service = KycService::new(
        KycConfig::default(),
        Arc::new(FileStore::open(dir.path().join("records")).unwrap()),
        Arc::new(FsBlobStore::new(&blob_dir).unwrap()),
    );
    let user = UserId::new("../../mallory");

    let id = service
        .submit(&user, pdf(DocumentType::Passport, "../../../etc/passwd", 4))
        .unwrap();
    let (record, bytes) = service.download(&id).unwrap();
    assert_eq!(bytes.len(), 4);
    assert!(record.file.storage_ref.0.split('/').all(|seg| seg != ".." && seg != "."));
    assert!(blob_dir.join(&record.file.storage_ref.0).exists());
    assert!(!dir.path().join("etc").exists());
}

#[test]
fn edge_tampered_audit_entry_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let open = || {
        KycService::new(
            KycConfig::default(),
            Arc::new(FileStore::open(dir.path()).unwrap()),
            Arc::new(MemoryBlobStore::new()),
        )
    };

    {
        let service = open();
        let user = UserId::new("alice");
        let admin = ReviewerId::new("admin");
        let a = service.submit(&user, pdf(DocumentType::Passport, "a.pdf", 4)).unwrap();
        let b = service.submit(&user, pdf(DocumentType::NationalId, "b.pdf", 4)).unwrap();
        service.reject(&a, &admin, "blurry image").unwrap();
        service.approve(&b, &admin, None).unwrap();
        assert_eq!(service.audit().verify().unwrap(), 2);
    }

    // Rewrite the first entry's notes behind the store's back.
    let mut files: Vec<_> = std::fs::read_dir(dir.path().join("audit"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    let mut json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap();
    json["entry"]["notes"] = serde_json::Value::String("crisp image".into());
    std::fs::write(&files[0], serde_json::to_vec_pretty(&json).unwrap()).unwrap();

    let err = open().audit().verify().unwrap_err();
    assert!(matches!(err, KycError::InvalidAuditChain { sequence: 1 }));
}

#[test]
fn edge_corrupt_record_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let service = KycService::new(
        KycConfig::default(),
        Arc::new(FileStore::open(dir.path()).unwrap()),
        Arc::new(MemoryBlobStore::new()),
    );
    let id = service
        .submit(&UserId::new("alice"), pdf(DocumentType::Passport, "a.pdf", 4))
        .unwrap();

    std::fs::write(
        dir.path().join("documents").join(format!("{}.json", id.0)),
        b"{ not json",
    )
    .unwrap();

    assert!(matches!(
        service.document(&id),
        Err(KycError::InvalidFileFormat(_))
    ));
    // A corrupt record is never silently treated as decidable.
    assert!(service.approve(&id, &ReviewerId::new("admin"), None).is_err());
}
