use crm_local_sheets::SheetError;
use crm_local_sheets::import::{
    ClientEntry, ClientIndex, Importer, RecordSink, ReportSink, SinkError,
};
use crm_local_sheets::model::{
    CanonicalRecord, ContactRecord, Field, ImportOutcome, ImportedRow, RawCell, Scalar, Sheet,
    SheetKind,
};
use crm_local_sheets::rows::{column_name, normalize_dimensions};
use crm_local_sheets::schema::Schemas;
use crm_local_sheets::workload::WorkloadCell;
use pretty_assertions::assert_eq;

#[derive(Default)]
struct RecordingSink {
    rows: Vec<ImportedRow>,
    reject_row: Option<usize>,
}

impl RecordSink for RecordingSink {
    fn create(&mut self, row: &ImportedRow) -> Result<String, SinkError> {
        if self.reject_row == Some(row.row()) {
            return Err("database is locked".into());
        }
        self.rows.push(row.clone());
        Ok(format!("id-{}", self.rows.len()))
    }
}

impl RecordingSink {
    fn records(&self) -> Vec<&CanonicalRecord> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                ImportedRow::Record(record) => Some(record),
                ImportedRow::Site(_) => None,
            })
            .collect()
    }
}

#[derive(Default)]
struct RecordingReport {
    outcomes: Vec<ImportOutcome>,
}

impl ReportSink for RecordingReport {
    fn deliver(&mut self, outcome: ImportOutcome) {
        self.outcomes.push(outcome);
    }
}

fn text(value: &str) -> RawCell {
    if value.is_empty() {
        RawCell::Blank
    } else {
        RawCell::from(value)
    }
}

fn sheet(rows: &[&[&str]]) -> Sheet {
    Sheet::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|value| text(value)).collect())
            .collect(),
    )
}

fn clients_directory() -> ClientIndex {
    let entry = |id: &str, company: &str, name: &str| ClientEntry {
        id: id.into(),
        company_name: company.into(),
        name: name.into(),
    };
    ClientIndex::new(vec![
        entry("c1", "Acme", "Dupont"),
        entry("c2", "Beta", "Dupont"),
        entry("c3", "Acme", "Martin"),
    ])
}

#[test]
fn one_bad_row_does_not_stop_the_batch() {
    let source = sheet(&[
        &["Entreprise", "Nom client", "Statut"],
        &["Acme", "Dupont", "actif"],
        &["Beta", "Martin", "peut-être"],
        &["Gamma", "Durand", "Inactif"],
        &["Delta", "Petit", ""],
        &["Epsilon", "Moreau", "oui"],
    ]);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Clients, &ClientIndex::default(), &mut sink)
        .expect("headers are valid");

    assert_eq!(
        outcome,
        ImportOutcome {
            created: 4,
            total: 5,
            errors: vec![
                "Row 3: invalid value 'peut-être' for status (expected one of: actif, inactif)"
                    .to_string()
            ],
        }
    );
    let rows: Vec<usize> = sink.records().iter().map(|record| record.row).collect();
    assert_eq!(rows, vec![2, 4, 5, 6]);
    assert_eq!(
        sink.records()[1].text(Field::Status),
        Some("inactif")
    );
    assert!(!sink.records()[2].contains(Field::Status));
}

#[test]
fn blank_rows_are_skipped_and_not_counted() {
    let source = sheet(&[
        &["Entreprise", "Client", "Notes"],
        &["Acme", "Dupont", ""],
        &["", "", ""],
        &["", "", "ignored column"],
        &["Beta", "Martin", ""],
    ]);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Clients, &ClientIndex::default(), &mut sink)
        .expect("headers are valid");

    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.created, 2);
    assert!(outcome.is_clean());
    assert_eq!(sink.records()[1].row, 5);
}

#[test]
fn every_problem_of_a_row_is_reported_together() {
    let source = sheet(&[
        &["Entreprise", "Client", "Statut", "Dépannage"],
        &["", "Dupont", "bof", "gratuit"],
    ]);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Clients, &ClientIndex::default(), &mut sink)
        .expect("headers are valid");

    assert_eq!(outcome.created, 0);
    assert_eq!(
        outcome.errors,
        vec![
            "Row 2: invalid value 'bof' for status (expected one of: actif, inactif); \
             invalid value 'gratuit' for depannage (expected one of: refacturable, non_refacturable); \
             missing value for company_name"
                .to_string()
        ]
    );
}

#[test]
fn contacts_are_grouped_by_slot() {
    let source = sheet(&[
        &[
            "Entreprise",
            "Client",
            "Contact 1 Nom",
            "Contact 1 Email",
            "Contact 2 Nom",
            "Contact 2 Téléphone",
            "Contact 3 Email",
        ],
        &["Acme", "Dupont", "Alice", "alice@acme.fr", "Bob", "0102030405", ""],
        &["Beta", "Martin", "", "", "", "", "orphan@beta.fr"],
    ]);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Clients, &ClientIndex::default(), &mut sink)
        .expect("headers are valid");

    assert_eq!(outcome.created, 1);
    assert_eq!(
        outcome.errors,
        vec!["Row 3: contact 3 has an email or phone but no name".to_string()]
    );
    assert_eq!(
        sink.records()[0].contacts,
        vec![
            ContactRecord {
                name: "Alice".into(),
                email: Some("alice@acme.fr".into()),
                phone: None,
            },
            ContactRecord {
                name: "Bob".into(),
                email: None,
                phone: Some("0102030405".into()),
            },
        ]
    );
}

#[test]
fn header_failures_abort_before_any_row() {
    let source = sheet(&[&["Email", "Téléphone"], &["a@b.fr", "0102"]]);
    let mut sink = RecordingSink::default();

    let error = Importer::default()
        .import_sheet(&source, SheetKind::Clients, &ClientIndex::default(), &mut sink)
        .expect_err("required columns are missing");

    assert!(matches!(error, SheetError::MissingColumns(_)));
    assert!(sink.rows.is_empty());
}

#[test]
fn sink_failures_become_row_errors() {
    let source = sheet(&[
        &["Entreprise", "Client"],
        &["Acme", "Dupont"],
        &["Beta", "Martin"],
    ]);
    let mut sink = RecordingSink {
        reject_row: Some(2),
        ..RecordingSink::default()
    };

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Clients, &ClientIndex::default(), &mut sink)
        .expect("headers are valid");

    assert_eq!(outcome.created, 1);
    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.errors, vec!["Row 2: database is locked".to_string()]);
}

#[test]
fn services_link_clients_and_fill_catalog_defaults() {
    let mut source = sheet(&[
        &["Entreprise", "Client", "Prestation", "Fréquence", "Intervalle", "Unité", "Montant"],
        &["", "Martin", "ramonage", "annuelle", "", "", ""],
        &["", "Dupont", "Extincteurs", "", "", "", ""],
        &["Beta", "Dupont", "Nettoyage de gaines", "", "", "mois", "1 200,50"],
        &["", "Durand", "Relamping", "", "", "", ""],
    ]);
    source.rows[3][4] = RawCell::Number(18.0);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Services, &clients_directory(), &mut sink)
        .expect("headers are valid");

    assert_eq!(
        outcome.errors,
        vec![
            "Row 3: client 'Dupont' is ambiguous (2 matches); add a company column to disambiguate"
                .to_string(),
            "Row 5: client 'Durand' not found".to_string(),
        ]
    );
    assert_eq!(outcome.created, 2);
    assert_eq!(outcome.total, 4);

    let records = sink.records();
    let chimney = records[0];
    assert_eq!(chimney.client_id.as_deref(), Some("c3"));
    assert_eq!(chimney.text(Field::Prestation), Some("Ramonage"));
    assert_eq!(chimney.text(Field::Category), Some("Sous-traitance"));
    assert_eq!(chimney.text(Field::BudgetCode), Some("S3050"));
    assert_eq!(chimney.text(Field::Frequency), Some("annuelle"));
    assert_eq!(chimney.get(Field::FrequencyInterval), Some(&Scalar::Integer(1)));
    assert_eq!(chimney.text(Field::FrequencyUnit), Some("years"));

    let ducts = records[1];
    assert_eq!(ducts.client_id.as_deref(), Some("c2"));
    assert_eq!(ducts.text(Field::Frequency), Some("interval:months:18"));
    assert_eq!(ducts.get(Field::FrequencyInterval), Some(&Scalar::Integer(18)));
    assert_eq!(ducts.get(Field::Amount), Some(&Scalar::Decimal(1200.5)));
}

#[test]
fn prestation_catalog_finds_every_definition_by_key_and_label() {
    let schemas = Schemas::new();
    let catalog = schemas.prestations();

    assert_eq!(catalog.definitions().len(), 36);
    for definition in catalog.definitions() {
        assert_eq!(catalog.find(definition.key), Some(definition));
        assert_eq!(catalog.find(&definition.label.to_uppercase()), Some(definition));
    }
    assert_eq!(catalog.find("jardinage"), None);
}

#[test]
fn unknown_company_scopes_the_not_found_message() {
    let source = sheet(&[
        &["Entreprise", "Client", "Prestation"],
        &["Gamma", "Dupont", "GTC"],
    ]);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Services, &clients_directory(), &mut sink)
        .expect("headers are valid");

    assert_eq!(
        outcome.errors,
        vec!["Row 2: client 'Dupont' not found for company 'Gamma'".to_string()]
    );
}

#[test]
fn invalid_frequency_is_a_row_error() {
    let source = sheet(&[
        &["Client", "Prestation", "Fréquence", "Unité"],
        &["Martin", "Sorbonnes", "custom", "semaines"],
    ]);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Services, &clients_directory(), &mut sink)
        .expect("headers are valid");

    assert_eq!(
        outcome.errors,
        vec![
            "Row 2: invalid frequency: unknown unit 'semaines' (expected months or years)"
                .to_string()
        ]
    );
}

#[test]
fn parts_rows_get_defaults_and_normalized_dimensions() {
    let mut source = sheet(&[
        &["Site", "Equipement", "Type", "Dimensions", "Quantité", "Semaine", "Commandé"],
        &["Lyon", "CTA 1", "Cousus sur fil", "592x592x48", "", "s12", "oui"],
        &["Lyon", "CTA 2", "Poche", "592 X 592 x 600", "", "", "non"],
        &["Lyon", "", "Poche", "", "", "", ""],
    ]);
    source.rows[2][4] = RawCell::Number(4.0);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Parts, &ClientIndex::default(), &mut sink)
        .expect("headers are valid");

    assert_eq!(
        outcome.errors,
        vec!["Row 4: missing value for equipment".to_string()]
    );

    let records = sink.records();
    assert_eq!(records[0].text(Field::Dimensions), Some("592 x 592"));
    assert_eq!(records[0].get(Field::Quantity), Some(&Scalar::Integer(1)));
    assert_eq!(records[0].text(Field::OrderWeek), Some("S12"));
    assert_eq!(records[0].get(Field::Ordered), Some(&Scalar::Flag(true)));
    assert_eq!(records[1].text(Field::Dimensions), Some("592 x 592 x 600"));
    assert_eq!(records[1].get(Field::Quantity), Some(&Scalar::Integer(4)));
}

#[test]
fn dimensions_without_enough_numbers_are_kept() {
    assert_eq!(normalize_dimensions("  20 cm ", false), "20 cm");
    assert_eq!(normalize_dimensions("287,5x592", true), "287,5 x 592");
}

#[test]
fn workload_rows_decode_days_and_reject_duplicates() {
    let mut source = sheet(&[
        &["Site", "J1", "J2", "J3"],
        &["Lyon", "ok", "", ""],
        &["Nantes", "warn", "maybe", ""],
        &["Lyon", "bad", "", ""],
        &["Brest", "", "ok:6", "rouge"],
    ]);
    source.rows[1][2] = RawCell::Number(8.0);
    let mut sink = RecordingSink::default();

    let outcome = Importer::default()
        .import_sheet(&source, SheetKind::Workload, &ClientIndex::default(), &mut sink)
        .expect("headers are valid");

    assert_eq!(
        outcome.errors,
        vec![
            "Row 3: column C (day 2): invalid workload value 'maybe' (expected ok, warn, bad, a number of hours or ok:<hours>)"
                .to_string(),
            "Row 4: duplicate site 'Lyon' (already on row 2)".to_string(),
        ]
    );
    assert_eq!(outcome.created, 2);

    let plans: Vec<_> = sink
        .rows
        .iter()
        .filter_map(|row| match row {
            ImportedRow::Site(plan) => Some(plan),
            ImportedRow::Record(_) => None,
        })
        .collect();
    assert_eq!(plans[0].name, "Lyon");
    assert_eq!(plans[0].cell(0), WorkloadCell::Ok(None));
    assert_eq!(plans[0].cell(1), WorkloadCell::Bad);
    assert_eq!(plans[1].name, "Brest");
    assert_eq!(plans[1].cell(1), WorkloadCell::Ok(Some(6.0)));
    assert_eq!(plans[1].cell(2), WorkloadCell::Bad);
    assert_eq!(plans[1].filled_days(), 2);
}

#[test]
fn column_letters_follow_spreadsheet_naming() {
    assert_eq!(column_name(0), "A");
    assert_eq!(column_name(25), "Z");
    assert_eq!(column_name(26), "AA");
    assert_eq!(column_name(365), "NB");
}

#[test]
fn unreadable_payload_is_reported_once_with_nothing_created() {
    let mut sink = RecordingSink::default();
    let mut report = RecordingReport::default();

    Importer::default().import_and_report(
        b"definitely not a workbook",
        SheetKind::Clients,
        &ClientIndex::default(),
        &mut sink,
        &mut report,
    );

    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.created, 0);
    assert_eq!(outcome.total, 0);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("unable to read the Excel file"));
    assert!(sink.rows.is_empty());
}
