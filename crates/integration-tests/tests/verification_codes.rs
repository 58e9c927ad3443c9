//! Phone verification code lifecycle, end to end.

#![allow(clippy::unwrap_used)]

use quickimage_identity::IdentityConfig;
use quickimage_identity::services::VerificationError;
use quickimage_integration_tests::{fresh_services, fresh_services_with};

#[tokio::test]
async fn code_is_consumed_on_first_successful_verify() {
    let (_, services) = fresh_services().await;

    services.verification.send("13800000000").await.unwrap();
    services
        .verification
        .verify("13800000000", "123456")
        .await
        .unwrap();

    let err = services
        .verification
        .verify("13800000000", "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, VerificationError::NoCodeRequested));
}

#[tokio::test]
async fn expired_code_is_rejected_and_removed() {
    let config = IdentityConfig {
        verification_code_ttl: chrono::Duration::seconds(-1),
        ..IdentityConfig::default()
    };
    let (_, services) = fresh_services_with(config).await;

    services.verification.send("13800000000").await.unwrap();
    assert!(matches!(
        services.verification.verify("13800000000", "123456").await,
        Err(VerificationError::Expired)
    ));
    assert!(matches!(
        services.verification.verify("13800000000", "123456").await,
        Err(VerificationError::NoCodeRequested)
    ));
}

#[tokio::test]
async fn any_input_shape_maps_to_one_canonical_code() {
    let (_, services) = fresh_services().await;

    // Later sends overwrite, regardless of how the number was written
    services.verification.send("138 0000 0000").await.unwrap();
    services.verification.send("+86 13800000000").await.unwrap();

    let phone = services
        .verification
        .verify("8613800000000", "123456")
        .await
        .unwrap();
    assert_eq!(phone.as_str(), "+8613800000000");
    assert_eq!(phone.masked(), "+86138****0000");
}

#[tokio::test]
async fn malformed_numbers_never_get_codes() {
    let (_, services) = fresh_services().await;

    for bad in ["", "12345678901", "23800000000", "1380000000", "abc"] {
        assert!(
            matches!(
                services.verification.send(bad).await,
                Err(VerificationError::InvalidPhone(_))
            ),
            "{bad:?} should be rejected"
        );
    }
}
