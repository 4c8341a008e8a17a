//! Composing calls for graphs built from account records, and accounting
//! for the deposits the composed transactions move.

use std::collections::BTreeSet;

use mandate_account::{AccountGraph, AccountRecord, ChainScope};
use mandate_call::{Call, MultisigCall, ProxyCall, ProxyType, Timepoint, Weight, find_target_call};
use mandate_common::{AccountId, H256, Ss58Prefix, multisig_address};
use mandate_dispatch::{
    ComposeError, Composer, DepositConstants, MemoryChainState, PendingMultisig, ReserveCause,
    deposit_effects,
};
use pretty_assertions::assert_eq;
use testresult::TestResult;

const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
const PURE: &str = "5HGjWAeFDfFCWPsjFQdVV2Msvz2XtMktvgocEZcCj68kUMaw";

const WEIGHT: Weight = Weight {
    ref_time: 5_000,
    proof_size: 128,
};

fn constants() -> DepositConstants {
    DepositConstants {
        deposit_base: 1_000,
        deposit_factor: 100,
        ..DepositConstants::default()
    }
}

/// `system.remarkWithEvent` with an empty remark, as the runtime encodes it.
const REMARK: [u8; 3] = [0, 7, 0];

fn remark() -> Call {
    Call::other("system", "remarkWithEvent", REMARK)
}

fn two_of_two(alice: &AccountId, bob: &AccountId) -> TestResult<(AccountId, AccountGraph)> {
    let multisig = multisig_address([alice, bob], 2);
    let record = AccountRecord::multisig(
        multisig.to_string(),
        2,
        vec![AccountRecord::plain(ALICE), AccountRecord::plain(BOB)],
    );
    let graph = AccountGraph::build(&record, Ss58Prefix::GENERIC, ChainScope::Unfiltered).ok_or("origin unreadable")?;
    Ok((multisig, graph))
}

#[tokio::test]
async fn it_composes_the_second_approval_of_a_two_of_two() -> TestResult {
    let (alice, bob): (AccountId, AccountId) = (ALICE.parse()?, BOB.parse()?);
    let (multisig, graph) = two_of_two(&alice, &bob)?;

    let chain = MemoryChainState::new(constants()).with_call_weight(WEIGHT);
    let when = Timepoint {
        height: 1_024,
        index: 3,
    };
    chain.set_multisig(
        multisig,
        H256::hash(&REMARK),
        PendingMultisig {
            when,
            deposit: 1_200,
            depositor: bob,
            approvals: vec![bob],
        },
    );
    let composer = Composer::new(chain);

    let composed = composer
        .build_for(&graph, &BTreeSet::from([alice]), remark())
        .await?;

    assert_eq!(composed.signer, alice);
    assert_eq!(
        composed.transaction,
        Call::from(MultisigCall::AsMulti {
            threshold: 2,
            other_signatories: vec![bob],
            maybe_timepoint: Some(when),
            call: Box::new(remark()),
            max_weight: WEIGHT,
        })
    );

    let (target, inner) = find_target_call(&composed.signer, &composed.transaction);
    assert_eq!((target, inner), (multisig, &remark()));

    let effects = deposit_effects(composer.chain(), &composed.signer, &composed.transaction).await;
    assert!(effects.reserve.is_empty());
    assert_eq!(effects.unreserve[&bob].amount, 1_200);
    Ok(())
}

#[tokio::test]
async fn it_reserves_for_a_first_approval_through_a_proxy() -> TestResult {
    let (alice, bob, pure): (AccountId, AccountId, AccountId) =
        (ALICE.parse()?, BOB.parse()?, PURE.parse()?);
    let multisig = multisig_address([&alice, &bob], 2);
    let record = AccountRecord::plain(PURE).with_delegatee(
        AccountRecord::multisig(
            multisig.to_string(),
            2,
            vec![AccountRecord::plain(ALICE), AccountRecord::plain(BOB)],
        ),
        "Any",
        "hub",
        0,
    );
    let graph = AccountGraph::build(&record, Ss58Prefix::GENERIC, ChainScope::Unfiltered).ok_or("origin unreadable")?;

    let composer = Composer::new(MemoryChainState::new(constants()).with_call_weight(WEIGHT));
    let composed = composer
        .build_for(&graph, &BTreeSet::from([bob]), remark())
        .await?;

    let proxied = Call::from(ProxyCall::Proxy {
        real: pure,
        force_proxy_type: Some(ProxyType::Any),
        call: Box::new(remark()),
    });
    assert_eq!(composed.signer, bob);
    assert_eq!(
        composed.transaction,
        Call::from(MultisigCall::AsMulti {
            threshold: 2,
            other_signatories: vec![alice],
            maybe_timepoint: None,
            call: Box::new(proxied),
            max_weight: WEIGHT,
        })
    );

    let effects = deposit_effects(composer.chain(), &bob, &composed.transaction).await;
    assert_eq!(effects.reserve[&bob].amount, 1_200);
    assert_eq!(effects.reserve[&bob].cause, ReserveCause::MultisigDeposit);
    assert!(effects.unreserve.is_empty());
    Ok(())
}

#[tokio::test]
async fn it_reports_unreachable_origins() -> TestResult {
    let (alice, bob): (AccountId, AccountId) = (ALICE.parse()?, BOB.parse()?);
    let (multisig, graph) = two_of_two(&alice, &bob)?;
    let composer = Composer::new(MemoryChainState::new(constants()));

    let outsider: AccountId = PURE.parse()?;
    let result = composer
        .build_for(&graph, &BTreeSet::from([outsider]), remark())
        .await;

    assert_eq!(
        result,
        Err(ComposeError::Resolve(
            mandate_account::ResolveError::UnresolvedPath { origin: multisig }
        ))
    );
    Ok(())
}
