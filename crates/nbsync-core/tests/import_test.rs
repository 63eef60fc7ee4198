#![allow(clippy::unwrap_used)]
// Importer behaviour against an in-memory NetBox.

mod common;

use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

use common::{Call, FakeNetbox, Failure, write};
use nbsync_core::{
    AbortKind, Collection, CoreError, ImportOptions, Importer, RowError, RunReport, Tally,
};

fn inventory() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "1_manufacturers.csv", "name,slug\nJuniper,juniper\n");
    write(root, "1_tags.csv", "name,slug\ncore,core\n");
    write(root, "3_device_roles.csv", "name,slug\nRouter,router\n");
    write(
        root,
        "3_device_types.csv",
        "model,slug,manufacturer,u_height\nMX204,mx204,Juniper,1\n",
    );
    write(root, "3_netbox_tenants.csv", "name,slug\nCustomer A,customer-a\n");
    write(
        root,
        "3_sites.csv",
        "name,slug,status,tenant\nPoP-CE,pop-ce,active,Customer A\n",
    );
    write(
        root,
        "4_devices.csv",
        "name,site,device_role,device_type,manufacturer,status,serial,tags\n\
         rtr01,PoP-CE,Router,MX204,Juniper,active,SN001,core\n",
    );
    write(
        root,
        "5_interfaces.csv",
        "device,name,type,mtu,enabled\nrtr01,xe-0/0/0,10gbase-x-sfpp,9000,true\n",
    );
    write(root, "5_vrfs.csv", "name,rd,tenant\nVRF-CORE,65000:1,Customer A\n");
    write(
        root,
        "6_ip_addresses.csv",
        "address,vrf,tenant,status\n200.129.0.10/30,VRF-CORE,Customer A,active\n",
    );
    dir
}

async fn import(fake: &FakeNetbox, dir: &Path, options: ImportOptions) -> RunReport {
    Importer::new(fake, options).run(dir).await.unwrap()
}

fn created_payload(fake: &FakeNetbox, collection: Collection) -> serde_json::Map<String, Value> {
    fake.calls()
        .into_iter()
        .find_map(|call| match call {
            Call::Create(c, payload) if c == collection => Some(payload),
            _ => None,
        })
        .unwrap()
}

fn only_failure(report: &RunReport) -> (u64, RowError) {
    let failures: Vec<_> = report.files.iter().flat_map(|f| f.failures.clone()).collect();
    assert_eq!(failures.len(), 1, "{failures:?}");
    (failures[0].line, failures[0].error.clone())
}

fn id_of(fake: &FakeNetbox, collection: Collection, key: &str, value: &str) -> i64 {
    fake.objects(collection)
        .iter()
        .find(|o| o.get(key).and_then(Value::as_str) == Some(value))
        .and_then(|o| o["id"].as_i64())
        .unwrap()
}

// ── First run ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_run_creates_every_row() {
    let fake = FakeNetbox::new();
    let dir = inventory();

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(
        report.totals(),
        Tally {
            created: 10,
            updated: 0,
            skipped: 0,
            errored: 0
        }
    );
    assert!(report.aborted.is_none());
    assert!(!report.has_failures());

    let order: Vec<&str> = report.files.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "1_manufacturers.csv",
            "1_tags.csv",
            "3_device_roles.csv",
            "3_device_types.csv",
            "3_netbox_tenants.csv",
            "3_sites.csv",
            "4_devices.csv",
            "5_interfaces.csv",
            "5_vrfs.csv",
            "6_ip_addresses.csv",
        ]
    );
}

#[tokio::test]
async fn test_references_become_ids() {
    let fake = FakeNetbox::new();
    let dir = inventory();
    import(&fake, dir.path(), ImportOptions::default()).await;

    let site_id = id_of(&fake, Collection::Sites, "name", "PoP-CE");
    let role_id = id_of(&fake, Collection::DeviceRoles, "name", "Router");
    let type_id = id_of(&fake, Collection::DeviceTypes, "model", "MX204");
    let tag_id = id_of(&fake, Collection::Tags, "name", "core");

    let device = created_payload(&fake, Collection::Devices);
    assert_eq!(device["site"], json!(site_id));
    assert_eq!(device["role"], json!(role_id));
    assert_eq!(device["device_type"], json!(type_id));
    assert_eq!(device["tags"], json!([tag_id]));
    assert!(!device.contains_key("manufacturer"));
    assert!(!device.contains_key("device_role"));

    let interface = created_payload(&fake, Collection::Interfaces);
    assert_eq!(interface["mtu"], json!(9000));
    assert_eq!(interface["enabled"], json!(true));

    let device_type = created_payload(&fake, Collection::DeviceTypes);
    assert_eq!(device_type["u_height"], json!(1));
}

// ── Idempotence ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_rerun_creates_nothing() {
    let fake = FakeNetbox::new();
    let dir = inventory();

    let first = import(&fake, dir.path(), ImportOptions::default()).await;
    let counts: Vec<usize> = first.files.iter().map(|f| fake.count(f.collection)).collect();

    let second = import(&fake, dir.path(), ImportOptions::default()).await;

    for (before, after) in first.files.iter().zip(&second.files) {
        assert_eq!(after.tally.created, 0, "{}", after.file);
        assert_eq!(after.tally.errored, 0, "{}: {:?}", after.file, after.failures);
        assert_eq!(
            after.tally.skipped + after.tally.updated,
            before.tally.created,
            "{}",
            after.file
        );
    }
    // Devices always match on (name, site) and are patched.
    assert_eq!(second.collection_totals(Collection::Devices).updated, 1);
    assert_eq!(second.collection_totals(Collection::IpAddresses).skipped, 1);

    let recount: Vec<usize> = second.files.iter().map(|f| fake.count(f.collection)).collect();
    assert_eq!(counts, recount);
}

// ── Upserts ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_device_upsert_patches_only_non_key_fields() {
    let fake = FakeNetbox::new();
    let site = fake.seed(Collection::Sites, json!({"name": "PoP-CE", "slug": "pop-ce"}));
    let device = fake.seed(
        Collection::Devices,
        json!({"name": "rtr01", "site": site, "serial": "SN001"}),
    );
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "4_devices.csv", "name,site,serial\nrtr01,PoP-CE,SN999\n");

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.totals().updated, 1);
    let mut body = serde_json::Map::new();
    body.insert("serial".into(), json!("SN999"));
    assert_eq!(fake.calls(), vec![Call::Update(Collection::Devices, device, body)]);
    assert_eq!(fake.objects(Collection::Devices)[0]["serial"], json!("SN999"));
}

#[tokio::test]
async fn test_same_device_name_at_another_site_is_created() {
    let fake = FakeNetbox::new();
    let ce = fake.seed(Collection::Sites, json!({"name": "PoP-CE", "slug": "pop-ce"}));
    fake.seed(Collection::Sites, json!({"name": "PoP-PB", "slug": "pop-pb"}));
    fake.seed(Collection::Devices, json!({"name": "rtr01", "site": ce}));
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "4_devices.csv", "name,site\nrtr01,PoP-PB\n");

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.totals().created, 1);
    assert_eq!(fake.count(Collection::Devices), 2);
}

#[tokio::test]
async fn test_ip_upsert_updates_on_second_run() {
    let fake = FakeNetbox::new();
    fake.seed(Collection::Vrfs, json!({"name": "VRF-CORE", "rd": "65000:1"}));
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "6_ip_addresses.csv",
        "address,vrf,description\n200.129.0.10/30,VRF-CORE,uplink\n",
    );
    let options = ImportOptions {
        ip_upsert: true,
        ..ImportOptions::default()
    };

    let first = import(&fake, dir.path(), options).await;
    let second = import(&fake, dir.path(), options).await;

    assert_eq!(first.totals().created, 1);
    assert_eq!(
        second.totals(),
        Tally {
            created: 0,
            updated: 1,
            skipped: 0,
            errored: 0
        }
    );
    assert_eq!(fake.count(Collection::IpAddresses), 1);
}

#[tokio::test]
async fn test_ip_upsert_without_vrf_only_matches_global_table() {
    let fake = FakeNetbox::new();
    let vrf = fake.seed(Collection::Vrfs, json!({"name": "VRF-CORE"}));
    fake.seed(
        Collection::IpAddresses,
        json!({"address": "10.0.0.1/32", "vrf": vrf}),
    );
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "6_ip_addresses.csv", "address\n10.0.0.1/32\n");
    let options = ImportOptions {
        ip_upsert: true,
        ..ImportOptions::default()
    };

    let report = import(&fake, dir.path(), options).await;

    assert_eq!(report.totals().created, 1);
    assert_eq!(fake.count(Collection::IpAddresses), 2);
}

#[tokio::test]
async fn test_ip_duplicate_without_upsert_is_skipped() {
    let fake = FakeNetbox::new();
    fake.seed(Collection::IpAddresses, json!({"address": "10.0.0.1/32"}));
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "6_ip_addresses.csv", "address,description\n10.0.0.1/32,lo0\n");

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.totals().skipped, 1);
    assert!(
        fake.calls()
            .iter()
            .all(|call| matches!(call, Call::Create(..)))
    );
}

#[tokio::test]
async fn test_ambiguous_device_match_fails_the_row() {
    let fake = FakeNetbox::new();
    let site = fake.seed(Collection::Sites, json!({"name": "PoP-CE", "slug": "pop-ce"}));
    fake.seed(Collection::Devices, json!({"name": "rtr01", "site": site}));
    fake.seed(Collection::Devices, json!({"name": "rtr01", "site": site}));
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "4_devices.csv", "name,site,serial\nrtr01,PoP-CE,SN999\n");

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.totals().errored, 1);
    assert_eq!(
        only_failure(&report),
        (
            2,
            RowError::UpsertAmbiguous {
                collection: Collection::Devices,
                key: format!("name=rtr01, site_id={site}"),
                count: 2,
            }
        )
    );
    assert!(fake.calls().is_empty());
}

// ── Row errors ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_ambiguous_reference_fails_the_row() {
    let fake = FakeNetbox::new();
    let ce = fake.seed(Collection::Sites, json!({"name": "PoP-CE"}));
    let pb = fake.seed(Collection::Sites, json!({"name": "PoP-PB"}));
    fake.seed(Collection::Devices, json!({"name": "rtr01", "site": ce}));
    fake.seed(Collection::Devices, json!({"name": "rtr01", "site": pb}));
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "5_interfaces.csv",
        "device,name,type\nrtr01,ge-0/0/0,1000base-t\n",
    );

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    let (line, error) = only_failure(&report);
    assert_eq!(line, 2);
    assert_eq!(
        error,
        RowError::ReferenceAmbiguous {
            field: "device".into(),
            value: "rtr01".into(),
            collection: Collection::Devices,
            count: 2,
        }
    );
    assert_eq!(fake.count(Collection::Interfaces), 0);
}

#[tokio::test]
async fn test_missing_reference_fails_only_its_row() {
    let fake = FakeNetbox::new();
    fake.seed(Collection::Tenants, json!({"name": "Customer A", "slug": "customer-a"}));
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "3_sites.csv",
        "name,slug,tenant\nPoP-CE,pop-ce,Nobody\nPoP-PB,pop-pb,Customer A\n",
    );

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    let (line, error) = only_failure(&report);
    assert_eq!(line, 2);
    assert_eq!(
        error,
        RowError::ReferenceNotFound {
            field: "tenant".into(),
            value: "Nobody".into(),
            collection: Collection::Tenants,
        }
    );
    assert_eq!(report.totals().created, 1);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_unparseable_mtu_fails_the_row() {
    let fake = FakeNetbox::new();
    fake.seed(Collection::Devices, json!({"name": "rtr01"}));
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "5_interfaces.csv",
        "device,name,type,mtu\nrtr01,xe-0/0/0,10gbase-x-sfpp,jumbo\n",
    );

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    let (_, error) = only_failure(&report);
    assert_eq!(
        error,
        RowError::TypeCoercionFailed {
            field: "mtu".into(),
            value: "jumbo".into(),
            expected: "integer",
        }
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_reference_falls_back_to_slug() {
    let fake = FakeNetbox::new();
    let juniper = fake.seed(
        Collection::Manufacturers,
        json!({"name": "Juniper Networks", "slug": "juniper-networks"}),
    );
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "2_platforms.csv",
        "name,slug,manufacturer\nJunos,junos,juniper networks\n",
    );

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.totals().created, 1);
    assert_eq!(
        created_payload(&fake, Collection::Platforms)["manufacturer"],
        json!(juniper)
    );
}

#[tokio::test]
async fn test_vrf_lookup_is_narrowed_by_tenant() {
    let fake = FakeNetbox::new();
    let a = fake.seed(Collection::Tenants, json!({"name": "Customer A"}));
    let b = fake.seed(Collection::Tenants, json!({"name": "Customer B"}));
    fake.seed(Collection::Vrfs, json!({"name": "MGMT", "tenant": a}));
    let vrf_b = fake.seed(Collection::Vrfs, json!({"name": "MGMT", "tenant": b}));
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "6_ip_addresses.csv",
        "address,vrf,tenant\n192.0.2.1/24,MGMT,Customer B\n",
    );

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.totals().created, 1);
    let ip = created_payload(&fake, Collection::IpAddresses);
    assert_eq!(ip["vrf"], json!(vrf_b));
    assert_eq!(ip["tenant"], json!(b));
}

#[tokio::test]
async fn test_circuit_header_aliases() {
    let fake = FakeNetbox::new();
    let provider = fake.seed(Collection::Providers, json!({"name": "Acme", "slug": "acme"}));
    let kind = fake.seed(Collection::CircuitTypes, json!({"name": "Transit", "slug": "transit"}));
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "7_circuits.csv",
        "Circuit ID,Provider Name,Circuit Type,Commit Rate\nCID-1,Acme,Transit,10000\n",
    );

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.totals().created, 1);
    let circuit = created_payload(&fake, Collection::Circuits);
    assert_eq!(circuit["cid"], json!("CID-1"));
    assert_eq!(circuit["provider"], json!(provider));
    assert_eq!(circuit["type"], json!(kind));
    assert_eq!(circuit["commit_rate"], json!(10000));
}

#[tokio::test]
async fn test_undecodable_record_fails_only_its_row() {
    let fake = FakeNetbox::new();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("3_sites.csv"),
        b"name,slug\nPoP CE,pop-ce\nS\xE3o Paulo,sao-paulo\nPoP RJ,pop-rj\n".as_slice(),
    )
    .unwrap();

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(
        report.totals(),
        Tally {
            created: 2,
            updated: 0,
            skipped: 0,
            errored: 1
        }
    );
    assert!(report.files[0].read_error.is_none());
    let (line, error) = only_failure(&report);
    assert_eq!(line, 3);
    assert!(matches!(error, RowError::Malformed { .. }), "{error:?}");
    assert_eq!(fake.count(Collection::Sites), 2);
}

#[tokio::test]
async fn test_unreadable_file_is_reported_and_the_run_continues() {
    let fake = FakeNetbox::new();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("1_tags.csv"),
        b"na\xFFme,slug\ncore,core\n".as_slice(),
    )
    .unwrap();
    write(dir.path(), "2_regions.csv", "name,slug\nEurope,europe\n");

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.files.len(), 2);
    assert!(report.files[0].read_error.is_some());
    assert_eq!(report.files[0].tally, Tally::default());
    assert_eq!(report.files[1].tally.created, 1);
    assert!(report.has_failures());
    assert!(report.aborted.is_none());
}

// ── Fatal errors ────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_token_aborts_immediately() {
    let fake = FakeNetbox::new();
    fake.fail_mutations(Failure::Unauthorized);
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "1_tags.csv", "name,slug\ncore,core\nedge,edge\n");
    write(dir.path(), "2_regions.csv", "name,slug\nEurope,europe\n");

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].tally.errored, 1);
    let (_, error) = only_failure(&report);
    assert!(matches!(error, RowError::RemoteUnavailable { .. }), "{error:?}");
    let abort = report.aborted.unwrap();
    assert_eq!(abort.kind, AbortKind::Authentication);
    assert_eq!(abort.file, "1_tags.csv");
    assert_eq!(abort.line, 2);
}

#[tokio::test]
async fn test_unreachable_host_aborts_after_threshold() {
    let fake = FakeNetbox::new();
    fake.fail_mutations(Failure::Unreachable);
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "1_tags.csv",
        "name,slug\na,a\nb,b\nc,c\nd,d\ne,e\n",
    );
    let options = ImportOptions {
        max_consecutive_failures: 3,
        ..ImportOptions::default()
    };

    let report = import(&fake, dir.path(), options).await;

    assert_eq!(report.files[0].tally.errored, 3);
    let abort = report.aborted.unwrap();
    assert_eq!(abort.kind, AbortKind::Connectivity);
    assert_eq!(abort.line, 4);
}

#[tokio::test]
async fn test_failed_verification_stops_before_any_file() {
    let fake = FakeNetbox::new();
    fake.fail_verify(Failure::Unauthorized);
    let dir = inventory();

    let err = Importer::new(&fake, ImportOptions::default())
        .run(dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }), "{err:?}");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_missing_directory_is_reported() {
    let fake = FakeNetbox::new();
    let dir = tempfile::tempdir().unwrap();

    let err = Importer::new(&fake, ImportOptions::default())
        .run(&dir.path().join("nope"))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::SourceNotFound { .. }), "{err:?}");
}

// ── File selection ──────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_and_cable_files_are_listed_as_skipped() {
    let fake = FakeNetbox::new();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "1_tags.csv", "name,slug\ncore,core\n");
    write(dir.path(), "9_cables.csv", "side_a_device,side_a_name\nrtr01,xe-0/0/0\n");
    write(dir.path(), "widgets.csv", "name\nsprocket\n");
    write(dir.path(), "notes.txt", "not a table\n");

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    assert_eq!(report.files.len(), 1);
    let skipped: Vec<&str> = report.skipped_files.iter().map(|s| s.file.as_str()).collect();
    assert_eq!(skipped, vec!["9_cables.csv", "widgets.csv"]);
    assert_eq!(fake.count(Collection::Cables), 0);
}

#[tokio::test]
async fn test_nested_directories_are_walked() {
    let fake = FakeNetbox::new();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "site-b/3_sites.csv", "name,slug\nPoP-PB,pop-pb\n");
    write(dir.path(), "site-a/3_sites.csv", "name,slug\nPoP-CE,pop-ce\n");

    let report = import(&fake, dir.path(), ImportOptions::default()).await;

    let order: Vec<&str> = report.files.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(order, vec!["site-a/3_sites.csv", "site-b/3_sites.csv"]);
    assert_eq!(report.totals().created, 2);
}

// ── Cables ──────────────────────────────────────────────────────────

fn seed_pair(fake: &FakeNetbox) -> (i64, i64) {
    let rtr = fake.seed(Collection::Devices, json!({"name": "rtr01"}));
    let sw = fake.seed(Collection::Devices, json!({"name": "sw01"}));
    let a = fake.seed(Collection::Interfaces, json!({"device": rtr, "name": "xe-0/0/0"}));
    let b = fake.seed(Collection::Interfaces, json!({"device": sw, "name": "eth1"}));
    (a, b)
}

#[tokio::test]
async fn test_cable_rows_become_terminations() {
    let fake = FakeNetbox::new();
    let (a, b) = seed_pair(&fake);
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "9_cables.csv",
        "side_a_device,side_a_name,side_b_device,side_b_name,label,length\n\
         rtr01,xe-0/0/0,sw01,eth1,XC-9,2.5\n",
    );
    let options = ImportOptions {
        with_cables: true,
        ..ImportOptions::default()
    };

    let report = import(&fake, dir.path(), options).await;

    assert_eq!(report.totals().created, 1);
    let cable = created_payload(&fake, Collection::Cables);
    assert_eq!(
        cable["a_terminations"],
        json!([{"object_type": "dcim.interface", "object_id": a}])
    );
    assert_eq!(
        cable["b_terminations"],
        json!([{"object_type": "dcim.interface", "object_id": b}])
    );
    assert_eq!(cable["label"], json!("XC-9"));
    assert_eq!(cable["length"], json!(2.5));
    assert!(cable.keys().all(|k| !k.starts_with("side_")));
}

#[tokio::test]
async fn test_cable_to_circuit_termination() {
    let fake = FakeNetbox::new();
    let (a, _) = seed_pair(&fake);
    let circuit = fake.seed(Collection::Circuits, json!({"cid": "CID-1"}));
    let term = fake.seed(
        Collection::CircuitTerminations,
        json!({"circuit": circuit, "term_side": "A"}),
    );
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "9_cables.csv",
        "side_a_type,side_a_device,side_a_name,side_b_type,side_b_circuit,side_b_side\n\
         dcim.interface,rtr01,xe-0/0/0,circuits.circuittermination,CID-1,a\n",
    );
    let options = ImportOptions {
        with_cables: true,
        ..ImportOptions::default()
    };

    let report = import(&fake, dir.path(), options).await;

    assert_eq!(report.totals().created, 1, "{:?}", report.files[0].failures);
    let cable = created_payload(&fake, Collection::Cables);
    assert_eq!(
        cable["a_terminations"],
        json!([{"object_type": "dcim.interface", "object_id": a}])
    );
    assert_eq!(
        cable["b_terminations"],
        json!([{"object_type": "circuits.circuittermination", "object_id": term}])
    );
}

#[tokio::test]
async fn test_unsupported_cable_end_fails_the_row() {
    let fake = FakeNetbox::new();
    seed_pair(&fake);
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "9_cables.csv",
        "side_a_device,side_a_name,side_b_type,side_b_device,side_b_name\n\
         rtr01,xe-0/0/0,dcim.frontport,sw01,eth1\n",
    );
    let options = ImportOptions {
        with_cables: true,
        ..ImportOptions::default()
    };

    let report = import(&fake, dir.path(), options).await;

    let (_, error) = only_failure(&report);
    assert_eq!(
        error,
        RowError::UnsupportedTermination {
            field: "side_b_type".into(),
            value: "dcim.frontport".into(),
        }
    );
}
