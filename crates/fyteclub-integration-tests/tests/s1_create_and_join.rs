//! S1 — Create & join (SPEC §8).
//!
//! Alice creates a syncshell and produces a live invite. Bob decodes and
//! joins: he receives a token signed by Alice, and both peers' phonebooks
//! converge to two Active entries after a single merge round.

use fyteclub_crypto::ed25519::generate_identity;
use fyteclub_phonebook::Phonebook;
use fyteclub_token::issue_token;
use fyteclub_types::phonebook::{MemberStatus, PhonebookEntry};
use fyteclub_types::TOKEN_DEFAULT_TTL_SECS;

fn active_entry(
    member: &fyteclub_crypto::ed25519::KeyPair,
    sequence: u64,
    last_seen_at: u64,
) -> PhonebookEntry {
    let peer_id = member.verifying_key.peer_id();
    let mut e = PhonebookEntry {
        member_peer_id: peer_id.clone(),
        display_name: peer_id.clone(),
        joined_at: last_seen_at,
        last_seen_at,
        status: MemberStatus::Active,
        tombstone_reason: None,
        sequence,
        author_peer_id: peer_id,
        signature: [0u8; 64],
    };
    e.signature = member.signing_key.sign(&e.signed_bytes()).to_bytes();
    e
}

#[tokio::test]
async fn create_then_join_converges_to_two_active_members() {
    // === Step 1: Alice creates the syncshell ===
    let alice = generate_identity();
    let bob = generate_identity();
    let group_id = [0xAAu8; 16];
    let group_secret = [0x11u8; 32];
    let t0 = 1_700_000_000u64;

    // === Step 2: Alice produces a live invite, expiring in 24h ===
    let invite = fyteclub_invite::create_live_invite(
        group_id,
        &group_secret,
        "v=0 offer".to_string(),
        vec!["relay.example:4433".to_string()],
        alice.verifying_key.peer_id(),
        &alice.signing_key,
        t0,
        fyteclub_invite::LIVE_INVITE_DEFAULT_TTL_SECS,
    )
    .expect("alice creates live invite");

    // === Step 3: Bob decodes the invite shortly after ===
    let redeemed = fyteclub_invite::decode_invite(&invite, &alice.verifying_key, t0 + 60)
        .expect("bob redeems the invite");
    assert_eq!(redeemed.group_id, group_id);
    assert_eq!(redeemed.group_secret, group_secret);

    // === Step 4: Alice (host) issues Bob a membership token ===
    let token = issue_token(
        &alice.signing_key,
        group_id,
        bob.verifying_key.peer_id(),
        alice.verifying_key.peer_id(),
        t0 + 60,
        TOKEN_DEFAULT_TTL_SECS,
        Default::default(),
    );
    fyteclub_token::verify_token(&token, &alice.verifying_key, t0 + 120)
        .expect("bob's token verifies under alice's key");
    assert_eq!(token.member_peer_id, bob.verifying_key.peer_id());

    // === Step 5: Both phonebooks merge each member's Active entry ===
    let mut alice_book = Phonebook::new();
    let mut bob_book = Phonebook::new();

    let alice_entry = active_entry(&alice, 1, t0);
    let bob_entry = active_entry(&bob, 1, t0 + 60);

    for book in [&mut alice_book, &mut bob_book] {
        book.merge(alice_entry.clone(), &alice.verifying_key, |_| false)
            .expect("merge alice's entry");
        book.merge(bob_entry.clone(), &bob.verifying_key, |_| false)
            .expect("merge bob's entry");
    }

    // === Step 6: Both peers converge within one gossip round ===
    for book in [&alice_book, &bob_book] {
        assert_eq!(book.len(), 2);
        assert_eq!(book.get(&alice.verifying_key.peer_id()).expect("alice present").status, MemberStatus::Active);
        assert_eq!(book.get(&bob.verifying_key.peer_id()).expect("bob present").status, MemberStatus::Active);
    }
}
