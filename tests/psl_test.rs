//! Public Suffix List integration tests.

use splitsync::cookies::psl::{is_public_suffix, is_valid_cookie_domain, registrable_domain, root_domain};

#[test]
fn test_tld_is_public_suffix() {
    assert!(is_public_suffix("com"));
    assert!(is_public_suffix("org"));
    assert!(is_public_suffix("co.uk"));
    assert!(is_public_suffix(".com.au"));
}

#[test]
fn test_domain_not_public_suffix() {
    assert!(!is_public_suffix("example.com"));
    assert!(!is_public_suffix("google.com"));
    assert!(!is_public_suffix("bbc.co.uk"));
}

#[test]
fn test_registrable_domain_extraction() {
    assert_eq!(registrable_domain("www.example.com"), Some("example.com".to_string()));
    assert_eq!(registrable_domain("mail.google.com"), Some("google.com".to_string()));
    assert_eq!(registrable_domain("www.bbc.co.uk"), Some("bbc.co.uk".to_string()));
}

#[test]
fn test_root_domain_falls_back_to_last_two_labels() {
    assert_eq!(root_domain("accounts.example.com"), Some("example.com".to_string()));
    assert_eq!(root_domain("localhost"), None);
}

#[test]
fn test_cookie_domain_validation() {
    assert!(is_valid_cookie_domain("example.com", "example.com"));
    assert!(is_valid_cookie_domain(".example.com", "app.example.com"));
    assert!(!is_valid_cookie_domain(".com", "example.com"));
    assert!(!is_valid_cookie_domain("other.com", "example.com"));
}

#[test]
fn test_supercookie_prevention() {
    assert!(!is_valid_cookie_domain("co.uk", "example.co.uk"));
    assert!(!is_valid_cookie_domain("github.io", "someone.github.io"));
}
