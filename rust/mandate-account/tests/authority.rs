//! End-to-end behavior of graph building, metadata and path enumeration on
//! account-service JSON.

use std::collections::BTreeSet;

use mandate_account::{
    AccountGraph, AccountRecord, ChainScope, FilterPath, MetaStore, filter_paths,
};
use mandate_call::ProxyType;
use mandate_common::{AccountId, NetworkSettings, multisig_address};
use pretty_assertions::assert_eq;
use testresult::TestResult;

const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
const CHARLIE: &str = "5FLSigC9HGRKVhB9FiEo4Y3koPsNmBmLJbpXg2mp1hXcS59Y";
const PURE: &str = "5HGjWAeFDfFCWPsjFQdVV2Msvz2XtMktvgocEZcCj68kUMaw";

fn settings() -> TestResult<NetworkSettings> {
    Ok(NetworkSettings::from_json(
        r#"{ "chain": "hub", "remoteRelations": { "relay": "hub" } }"#,
    )?)
}

#[test]
fn it_resolves_a_two_of_two_multisig() -> TestResult {
    let alice: AccountId = ALICE.parse()?;
    let bob: AccountId = BOB.parse()?;
    let multisig = multisig_address([&alice, &bob], 2);

    let record = AccountRecord::from_json(&format!(
        r#"{{
            "address": "{multisig}",
            "type": "multisig",
            "threshold": 2,
            "members": [{{ "address": "{ALICE}" }}, {{ "address": "{BOB}" }}]
        }}"#
    ))?;
    let settings = settings()?;
    let graph = AccountGraph::build(&record, settings.ss58_prefix, ChainScope::of(&settings))
        .ok_or("origin unreadable")?;

    let paths = filter_paths(&graph, &BTreeSet::from([alice]));
    assert_eq!(
        paths,
        vec![vec![FilterPath::Multisig {
            multisig_address: multisig,
            threshold: 2,
            other_signatories: vec![bob],
            address: alice,
        }]]
    );
    Ok(())
}

#[test]
fn it_scopes_pure_account_delegatees_to_the_chain() -> TestResult {
    let record = AccountRecord::from_json(&format!(
        r#"{{
            "address": "{PURE}",
            "type": "pure",
            "creator": "{ALICE}",
            "createdBlock": 12,
            "createdExtrinsicIndex": 3,
            "network": "hub",
            "delegatees": [
                {{ "address": "{ALICE}", "proxyType": "Any", "proxyNetwork": "hub" }},
                {{ "address": "{ALICE}", "proxyType": "Any", "proxyNetwork": "relay" }},
                {{ "address": "{BOB}", "proxyType": "Staking", "proxyNetwork": "relay", "proxyDelay": 10 }},
                {{ "address": "{CHARLIE}", "proxyType": "Any", "proxyNetwork": "elsewhere" }}
            ]
        }}"#
    ))?;
    let settings = settings()?;
    let graph = AccountGraph::build(&record, settings.ss58_prefix, ChainScope::of(&settings))
        .ok_or("origin unreadable")?;

    let delegatees: Vec<(String, bool)> = graph
        .root()
        .delegatees
        .iter()
        .map(|delegatee| {
            (
                graph.node(delegatee.node).address.clone(),
                delegatee.is_remote_proxy,
            )
        })
        .collect();
    assert_eq!(
        delegatees,
        vec![(ALICE.to_string(), false), (BOB.to_string(), true)]
    );

    let store = MetaStore::new();
    store.merge([&graph]);
    let pure = store.get(&PURE.parse()?).ok_or("missing pure")?;
    assert!(pure.is_pure && pure.is_proxied);
    assert_eq!(pure.created_block, Some(12));
    assert_eq!(
        pure.proxy_networks.iter().map(|chain| chain.as_str()).collect::<Vec<_>>(),
        vec!["hub", "relay"]
    );

    let bob = store.get(&BOB.parse()?).ok_or("missing bob")?;
    assert_eq!(bob.proxy_type, Some(ProxyType::Staking));
    assert_eq!(bob.delay, Some(10));

    let paths = filter_paths(&graph, &BTreeSet::from([BOB.parse()?]));
    assert_eq!(paths.len(), 1);
    assert!(matches!(
        paths[0].as_slice(),
        [FilterPath::Proxy { delay: 10, proxy_type: ProxyType::Staking, .. }]
    ));
    Ok(())
}
