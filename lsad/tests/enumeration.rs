//! Integration tests for resumable enumeration and concurrent callers.

use std::sync::Mutex;
use std::thread;

use lsad::lsa::account::account_access::ACCOUNT_ALL_ACCESS;
use lsad::lsa::policy::policy_access::POLICY_ALL_ACCESS;
use lsad::lsa::trust::trusted_domain_access::TRUSTED_ALL_ACCESS;
use lsad::lsa::trust::{TrustAttributes, TrustDirection, TrustType};
use lsad::lsa::{AuthInformation, Enumerated, TrustedDomainInformationEx};
use lsad::{CallerIdentity, Handle, LsaConfig, LsaServer, NtStatus, SessionId, Sid};

fn admin(session: u64) -> CallerIdentity {
    CallerIdentity::administrator(SessionId(session), "S-1-5-21-9-9-9-500".parse().unwrap())
}

fn user_sid(rid: u32) -> Sid {
    format!("S-1-5-21-100-200-300-{}", rid).parse().unwrap()
}

fn setup() -> (LsaServer, CallerIdentity, Handle) {
    let server = LsaServer::new(LsaConfig::default());
    let identity = admin(1);
    let policy = server.open_policy2(&identity, None, POLICY_ALL_ACCESS).unwrap();
    (server, identity, policy)
}

/// Drain an enumeration, returning every batch
fn drain<T>(mut next: impl FnMut(u32) -> Result<Enumerated<T>, NtStatus>) -> Vec<Enumerated<T>> {
    let mut batches = Vec::new();
    let mut resume = 0;
    loop {
        let batch = next(resume).expect("enumeration call should succeed");
        let done = batch.status != NtStatus::MoreEntries;
        resume = batch.resume_handle;
        batches.push(batch);
        if done {
            return batches;
        }
    }
}

#[test]
fn paging_takes_ceiling_of_count_over_batch() {
    let (server, identity, policy) = setup();
    for rid in 1000..1023 {
        server
            .create_account(&identity, policy, user_sid(rid), ACCOUNT_ALL_ACCESS)
            .unwrap();
    }

    for batch_size in [1u32, 5, 7, 23, 100] {
        let batches = drain(|resume| server.enumerate_accounts(&identity, policy, resume, batch_size));
        let expected = (23 + batch_size as usize - 1) / batch_size as usize;
        assert_eq!(batches.len(), expected, "batch size {}", batch_size);

        let sids: Vec<Sid> = batches.iter().flat_map(|b| b.items.iter().copied()).collect();
        let wanted: Vec<Sid> = (1000..1023).map(user_sid).collect();
        assert_eq!(sids, wanted);

        let last = batches.last().unwrap();
        assert_eq!(last.status, NtStatus::Success);
        assert_eq!(last.resume_handle, 0);
    }
    assert_eq!(server.stats().enumeration_contexts, 0);
}

#[test]
fn cursor_sees_live_changes() {
    let (server, identity, policy) = setup();
    for rid in 1..=5 {
        server
            .create_account(&identity, policy, user_sid(rid), ACCOUNT_ALL_ACCESS)
            .unwrap();
    }

    let first = server.enumerate_accounts(&identity, policy, 0, 2).unwrap();
    assert_eq!(first.items, vec![user_sid(1), user_sid(2)]);
    assert_eq!(first.status, NtStatus::MoreEntries);

    // Remove one not yet returned, add one after the cursor
    let doomed = server
        .open_account(&identity, policy, user_sid(3), ACCOUNT_ALL_ACCESS)
        .unwrap();
    server.delete_object(&identity, doomed).unwrap();
    server
        .create_account(&identity, policy, user_sid(6), ACCOUNT_ALL_ACCESS)
        .unwrap();

    let second = server
        .enumerate_accounts(&identity, policy, first.resume_handle, 2)
        .unwrap();
    assert_eq!(second.items, vec![user_sid(4), user_sid(5)]);
    assert_eq!(second.status, NtStatus::MoreEntries);

    let third = server
        .enumerate_accounts(&identity, policy, second.resume_handle, 2)
        .unwrap();
    assert_eq!(third.items, vec![user_sid(6)]);
    assert_eq!(third.status, NtStatus::Success);
}

#[test]
fn resume_handle_misuse() {
    let (server, identity, policy) = setup();
    let other = admin(2);
    let other_policy = server.open_policy2(&other, None, POLICY_ALL_ACCESS).unwrap();

    let batch = server.enumerate_privileges(&identity, policy, 0, 3).unwrap();
    let token = batch.resume_handle;
    assert_ne!(token, 0);

    assert_eq!(
        server.enumerate_privileges(&other, other_policy, token, 3).map(|_| ()),
        Err(NtStatus::InvalidParameter)
    );
    assert_eq!(
        server.enumerate_accounts(&identity, policy, token, 3).map(|_| ()),
        Err(NtStatus::InvalidParameter)
    );
    assert_eq!(
        server.enumerate_privileges(&identity, policy, 0xDEAD, 3).map(|_| ()),
        Err(NtStatus::InvalidParameter)
    );
    assert_eq!(
        server.enumerate_privileges(&identity, policy, 0, 0).map(|_| ()),
        Err(NtStatus::InvalidParameter)
    );

    // The rejected calls left the context where it was
    let next = server.enumerate_privileges(&identity, policy, token, 3).unwrap();
    assert_eq!(next.items[0].name, "SeIncreaseQuotaPrivilege");
}

#[test]
fn trusted_domains_in_creation_order() {
    let (server, identity, policy) = setup();
    let names = ["zeta", "alpha", "mid"];
    for (n, name) in names.iter().enumerate() {
        let info = TrustedDomainInformationEx {
            name: format!("{}.example", name),
            flat_name: name.to_uppercase(),
            sid: Some(format!("S-1-5-21-40-50-{}", n + 1).parse().unwrap()),
            trust_direction: TrustDirection::Bidirectional,
            trust_type: TrustType::Uplevel,
            trust_attributes: TrustAttributes::empty(),
        };
        server
            .create_trusted_domain_ex(&identity, policy, info, AuthInformation::default(), TRUSTED_ALL_ACCESS)
            .unwrap();
    }

    let basic = drain(|resume| server.enumerate_trusted_domains(&identity, policy, resume, 2));
    let flat: Vec<String> = basic
        .iter()
        .flat_map(|b| b.items.iter().map(|t| t.name.clone()))
        .collect();
    assert_eq!(flat, vec!["ZETA", "ALPHA", "MID"]);

    let ex = server.enumerate_trusted_domains_ex(&identity, policy, 0, 10).unwrap();
    let dns: Vec<&str> = ex.items.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(dns, vec!["zeta.example", "alpha.example", "mid.example"]);
    assert_eq!(ex.status, NtStatus::Success);
}

#[test]
fn concurrent_sessions() {
    let server = LsaServer::new(LsaConfig::default());

    thread::scope(|scope| {
        for session in 1..=4u64 {
            let server = &server;
            scope.spawn(move || {
                let identity = admin(session);
                let policy = server.open_policy2(&identity, None, POLICY_ALL_ACCESS).unwrap();
                for n in 0..25u32 {
                    let rid = session as u32 * 1000 + n;
                    let account = server
                        .create_account(&identity, policy, user_sid(rid), ACCOUNT_ALL_ACCESS)
                        .unwrap();
                    server.close(&identity, account).unwrap();
                }
                let batches = drain(|resume| server.enumerate_privileges(&identity, policy, resume, 4));
                let count: usize = batches.iter().map(|b| b.items.len()).sum();
                assert_eq!(count, 35);
                server.close_session(identity.session);
            });
        }
    });

    let stats = server.stats();
    assert_eq!(stats.accounts, 100);
    assert_eq!(stats.open_handles, 0);
    assert_eq!(stats.enumeration_contexts, 0);
}

#[test]
fn contended_creates_agree() {
    let server = LsaServer::new(LsaConfig::default());
    let sid = user_sid(4242);

    let outcomes: Vec<Result<Handle, NtStatus>> = thread::scope(|scope| {
        let workers: Vec<_> = (1..=8u64)
            .map(|session| {
                let server = &server;
                scope.spawn(move || {
                    let identity = admin(session);
                    let policy = server.open_policy2(&identity, None, POLICY_ALL_ACCESS).unwrap();
                    server.create_account(&identity, policy, sid, ACCOUNT_ALL_ACCESS)
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err().copied())
        .all(|status| status == NtStatus::ObjectNameCollision));
    assert_eq!(server.stats().accounts, 1);
}

/// A listing running alongside creates returns every account that existed
/// before its final batch, each once
#[test]
fn cursor_keeps_up_with_concurrent_creates() {
    let server = LsaServer::new(LsaConfig::default());
    let created = Mutex::new(Vec::new());

    thread::scope(|scope| {
        for session in 1..=4u64 {
            let (server, created) = (&server, &created);
            scope.spawn(move || {
                let identity = admin(session);
                let policy = server.open_policy2(&identity, None, POLICY_ALL_ACCESS).unwrap();
                for n in 0..50u32 {
                    let sid = user_sid(session as u32 * 1000 + n);
                    let account = server
                        .create_account(&identity, policy, sid, ACCOUNT_ALL_ACCESS)
                        .unwrap();
                    server.close(&identity, account).unwrap();
                    created.lock().unwrap().push(sid);
                }
            });
        }

        let identity = admin(9);
        let policy = server.open_policy2(&identity, None, POLICY_ALL_ACCESS).unwrap();
        while created.lock().unwrap().len() < 10 {
            thread::yield_now();
        }

        let mut seen: Vec<Sid> = Vec::new();
        let mut resume = 0;
        let known = loop {
            let known = created.lock().unwrap().len();
            let batch = server.enumerate_accounts(&identity, policy, resume, 1).unwrap();
            seen.extend(batch.items.iter().copied());
            if batch.status != NtStatus::MoreEntries {
                break known;
            }
            resume = batch.resume_handle;
        };

        let list = created.lock().unwrap();
        for sid in &list[..known] {
            assert!(seen.contains(sid), "{} missed by the listing", sid);
        }
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), seen.len());
    });
    assert_eq!(server.stats().accounts, 200);
}
