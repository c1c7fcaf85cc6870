//! Constraint creation through the operations facade, duplicates included.

use cibkit::constraints::{LocationTarget, Options, ResourceSetSpec};
use cibkit::{Config, Document, Error, ReportList, ReportMessage, Severity, locator, operations};
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn doc() -> Document {
    Document::parse(
        r#"<cib><configuration>
             <resources>
               <primitive id="A"/>
               <primitive id="B"/>
               <clone id="C"><primitive id="CA"/></clone>
             </resources>
             <constraints/>
           </configuration></cib>"#,
    )
    .unwrap()
}

fn options(pairs: &[(&str, &str)]) -> Options {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn expect_reports(result: cibkit::Result<ReportList>) -> ReportList {
    match result {
        Err(Error::Reports(reports)) => reports,
        Err(err) => panic!("expected reports, got {err}"),
        Ok(reports) => panic!("expected failure, got {reports:?}"),
    }
}

fn duplicate_ids(reports: &ReportList) -> Vec<String> {
    reports
        .iter()
        .find_map(|item| match &item.message {
            ReportMessage::DuplicateConstraintsExist { constraint_ids } => {
                Some(constraint_ids.clone())
            }
            _ => None,
        })
        .unwrap_or_default()
}

#[test]
fn test_colocation_sets_duplicate() {
    init();
    let mut doc = doc();
    let config = Config::default();
    let sets = [ResourceSetSpec::new(["A", "B"])];

    let reports =
        operations::create_colocation_with_sets(&mut doc, &sets, &Options::new(), &config)
            .unwrap();
    assert!(reports.is_empty());
    assert!(locator::exists(&doc, "pcs_rsc_colocation_set_AABB"));

    let before = doc.clone();
    let reports = expect_reports(operations::create_colocation_with_sets(
        &mut doc,
        &sets,
        &options(&[("score", "100")]),
        &config,
    ));
    assert_eq!(duplicate_ids(&reports), vec!["pcs_rsc_colocation_set_AABB"]);
    assert_eq!(doc, before);

    // set membership order matters
    let reversed = [ResourceSetSpec::new(["B", "A"])];
    operations::create_colocation_with_sets(&mut doc, &reversed, &Options::new(), &config)
        .unwrap();
}

#[test]
fn test_allowed_duplicate_is_a_warning() {
    init();
    let mut doc = doc();
    let mut config = Config::default();
    operations::create_order(&mut doc, "A", "B", &Options::new(), &config).unwrap();

    config.constraints.allow_duplicates = true;
    let reports = operations::create_order(
        &mut doc,
        "A",
        "B",
        &options(&[("first-action", "promote")]),
        &config,
    )
    .unwrap();

    assert_eq!(reports.len(), 1);
    let item = reports.iter().next().unwrap();
    assert_eq!(item.severity, Severity::Warning);
    assert_eq!(duplicate_ids(&reports), vec!["order-A-B-mandatory"]);
    let section = locator::constraints_section(&doc).unwrap();
    assert_eq!(doc.children(section).len(), 2);
}

#[test]
fn test_plain_colocation_either_direction() {
    init();
    let mut doc = doc();
    let config = Config::default();
    operations::create_colocation(&mut doc, "A", "B", &Options::new(), &config).unwrap();

    let reports = expect_reports(operations::create_colocation(
        &mut doc,
        "B",
        "A",
        &options(&[("score", "-INFINITY")]),
        &config,
    ));
    assert_eq!(duplicate_ids(&reports), vec!["colocation-A-B-INFINITY"]);
}

#[test]
fn test_ticket_role_spellings_duplicate() {
    init();
    let mut doc = doc();
    let config = Config::default();
    operations::create_ticket(&mut doc, "T", "A", &options(&[("rsc-role", "Master")]), &config)
        .unwrap();

    let reports = expect_reports(operations::create_ticket(
        &mut doc,
        "T",
        "A",
        &options(&[("rsc-role", "promoted")]),
        &config,
    ));
    assert_eq!(duplicate_ids(&reports), vec!["ticket-T-A-Promoted"]);

    operations::create_ticket(&mut doc, "T", "A", &Options::new(), &config).unwrap();
}

#[test]
fn test_location_rule_whitespace_duplicate() {
    init();
    let mut doc = doc();
    let config = Config::default();
    let target = LocationTarget::Resource("A".to_string());
    operations::create_location_with_rule(
        &mut doc,
        &target,
        "#uname eq node1 or defined pingd",
        &Options::new(),
        &Options::new(),
        &config,
    )
    .unwrap();

    let reports = expect_reports(operations::create_location_with_rule(
        &mut doc,
        &target,
        "#uname   eq  node1    or defined   pingd",
        &Options::new(),
        &options(&[("score", "10")]),
        &config,
    ));
    assert_eq!(duplicate_ids(&reports), vec!["location-A"]);

    operations::create_location_with_rule(
        &mut doc,
        &target,
        "#uname eq node2",
        &Options::new(),
        &Options::new(),
        &config,
    )
    .unwrap();
}

#[test]
fn test_add_rule_duplicating_other_location() {
    init();
    let mut doc = Document::parse(
        r#"<cib><configuration>
             <resources><primitive id="A"/></resources>
             <constraints>
               <rsc_location id="L1" rsc="A">
                 <rule id="L1-rule" score="INFINITY">
                   <expression id="L1-rule-expr" attribute="pingd" operation="defined"/>
                 </rule>
               </rsc_location>
               <rsc_location id="L2" rsc="A" node="n1" score="100"/>
             </constraints>
           </configuration></cib>"#,
    )
    .unwrap();
    let before = doc.clone();
    let config = Config::default();

    let reports = expect_reports(operations::add_rule_to_location(
        &mut doc,
        "L2",
        "defined pingd",
        &Options::new(),
        &config,
    ));
    assert_eq!(duplicate_ids(&reports), vec!["L1"]);
    assert_eq!(doc, before);

    operations::add_rule_to_location(&mut doc, "L2", "not_defined pingd", &Options::new(), &config)
        .unwrap();
    let l2 = locator::find_by_id(&doc, "L2")[0];
    assert_eq!(doc.attr(l2, "node"), None);
    assert!(locator::exists(&doc, "L2-rule"));
}

#[test]
fn test_multi_instance_override_from_config_file() {
    init();
    let mut doc = doc();

    let reports = expect_reports(operations::create_colocation(
        &mut doc,
        "CA",
        "B",
        &Options::new(),
        &Config::default(),
    ));
    let item = reports.errors().next().unwrap();
    assert!(matches!(
        &item.message,
        ReportMessage::ResourceForConstraintIsMultiinstance { parent_id, .. } if parent_id == "C"
    ));
    assert!(reports.to_json().unwrap().contains("RESOURCE_FOR_CONSTRAINT_IS_MULTIINSTANCE"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cibkit.toml");
    std::fs::write(&path, "[constraints]\nallow_multi_instance = true\n").unwrap();
    let config = Config::load_from(&path).unwrap();

    let reports =
        operations::create_colocation(&mut doc, "CA", "B", &Options::new(), &config).unwrap();
    assert_eq!(reports.len(), 1);
    assert!(!reports.has_errors());
    assert!(locator::exists(&doc, "colocation-CA-B-INFINITY"));
}

#[test]
fn test_custom_set_prefix() {
    init();
    let mut doc = doc();
    let config = Config::from_toml_str("[ids]\nset_constraint_prefix = \"cib\"\n").unwrap();
    let sets = [
        ResourceSetSpec::new(["A"]).with_option("sequential", "false"),
        ResourceSetSpec::new(["B"]).with_option("action", "Start"),
    ];
    operations::create_order_with_sets(&mut doc, &sets, &options(&[("kind", "optional")]), &config)
        .unwrap();

    let created = locator::find_by_id(&doc, "cib_rsc_order_set_AABB")[0];
    assert_eq!(doc.attr(created, "kind"), Some("Optional"));
    let sets = doc.children(created);
    assert_eq!(doc.attr(sets[0], "sequential"), Some("false"));
    assert_eq!(doc.attr(sets[1], "action"), Some("start"));
}
