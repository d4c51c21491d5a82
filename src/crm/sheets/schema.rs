//! Static lookup data for every sheet kind.
//!
//! Built once (see [`Schemas::new`]) and shared by reference; nothing in here is
//! mutated after construction.

use std::collections::HashMap;

use crate::crm::sheets::header::normalize_header;
use crate::crm::sheets::model::{ContactField, Field, SheetKind};

/// A closed set of legal values, reachable through normalized aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    aliases: HashMap<String, &'static str>,
    legal: Vec<&'static str>,
}

impl ChoiceSet {
    /// Each legal value is also an alias of itself.
    pub fn new(legal: &[&'static str], extra_aliases: &[(&str, &'static str)]) -> Self {
        let mut aliases: HashMap<String, &'static str> = legal
            .iter()
            .map(|value| (normalize_header(value), *value))
            .collect();
        for (alias, value) in extra_aliases {
            aliases.insert(normalize_header(alias), *value);
        }
        Self {
            aliases,
            legal: legal.to_vec(),
        }
    }

    /// Looks up an already-normalized value.
    pub fn canonical(&self, normalized: &str) -> Option<&'static str> {
        self.aliases.get(normalized).copied()
    }

    pub fn legal(&self) -> &[&'static str] {
        &self.legal
    }
}

/// How the value coercer treats a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Choice(ChoiceSet),
    WeekCode,
    Flag,
    Quantity,
    Decimal,
}

/// Secondary alias table for a repeated column group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: &'static str,
    subfields: HashMap<String, ContactField>,
}

impl GroupSpec {
    pub fn subfield_for(&self, normalized: &str) -> Option<ContactField> {
        self.subfields.get(normalized).copied()
    }
}

/// Everything needed to read one kind of sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSchema {
    pub kind: SheetKind,
    aliases: HashMap<String, Field>,
    group: Option<GroupSpec>,
    required: Vec<Field>,
    kinds: HashMap<Field, FieldKind>,
}

impl SheetSchema {
    fn new(kind: SheetKind, aliases: &[(&str, Field)], required: &[Field]) -> Self {
        Self {
            kind,
            aliases: aliases
                .iter()
                .map(|(alias, field)| (normalize_header(alias), *field))
                .collect(),
            group: None,
            required: required.to_vec(),
            kinds: HashMap::new(),
        }
    }

    fn with_kind(mut self, field: Field, kind: FieldKind) -> Self {
        self.kinds.insert(field, kind);
        self
    }

    fn with_group(mut self, name: &'static str, subfields: &[(&str, ContactField)]) -> Self {
        self.group = Some(GroupSpec {
            name,
            subfields: subfields
                .iter()
                .map(|(alias, subfield)| (normalize_header(alias), *subfield))
                .collect(),
        });
        self
    }

    /// Looks up an already-normalized header.
    pub fn field_for(&self, normalized: &str) -> Option<Field> {
        self.aliases.get(normalized).copied()
    }

    pub fn group(&self) -> Option<&GroupSpec> {
        self.group.as_ref()
    }

    pub fn required(&self) -> &[Field] {
        &self.required
    }

    /// Coercion rule for `field`; fields without one are plain text.
    pub fn field_kind(&self, field: Field) -> Option<&FieldKind> {
        self.kinds.get(&field)
    }
}

/// A predefined subcontracted service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrestationDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub budget_code: &'static str,
}

const SUBCONTRACTING: &str = "Sous-traitance";
const RENTALS: &str = "Locations";

const PRESTATIONS: &[(&str, &str, &str, &str)] = &[
    ("analyse_eau", "Analyse d'eau", SUBCONTRACTING, "S1000"),
    ("analyse_huile", "Analyse d'huile", SUBCONTRACTING, "S1010"),
    ("analyse_eau_nappe", "Analyse eau de nappe", SUBCONTRACTING, "S1020"),
    ("analyse_legionnelle", "Analyse légionnelle", SUBCONTRACTING, "S1030"),
    ("analyse_potabilite", "Analyse potabilité", SUBCONTRACTING, "S1040"),
    ("colonnes_seches", "Colonnes sèches", SUBCONTRACTING, "S1050"),
    ("controle_acces", "Contrôle d'accès", SUBCONTRACTING, "S1060"),
    ("controle_ssi", "Contrôle SSI", SUBCONTRACTING, "S1070"),
    ("detection_co", "Détection CO", SUBCONTRACTING, "S1080"),
    ("detection_freon", "Détection fréon", SUBCONTRACTING, "S1090"),
    ("detection_incendie", "Détection incendie", SUBCONTRACTING, "S2000"),
    ("extincteurs", "Extincteurs", SUBCONTRACTING, "S2010"),
    ("exutoires", "Exutoires", SUBCONTRACTING, "S2020"),
    ("gtc", "GTC", SUBCONTRACTING, "S2030"),
    ("inspection_video_puits", "Inspection vidéo puits", SUBCONTRACTING, "S2040"),
    ("maintenance_cellule_hta", "Maintenance cellule HTA", SUBCONTRACTING, "S2050"),
    ("maintenance_constructeur", "Maintenance constructeur", SUBCONTRACTING, "S2060"),
    ("maintenance_groupe_electrogene", "Maintenance groupe électrogène", SUBCONTRACTING, "S2070"),
    ("maintenance_groupe_froid", "Maintenance groupe froid", SUBCONTRACTING, "S2080"),
    ("nettoyage_gaines", "Nettoyage de gaines", SUBCONTRACTING, "S3000"),
    ("onduleurs", "Onduleurs", SUBCONTRACTING, "S3010"),
    ("pompe_relevage", "Pompe de relevage", SUBCONTRACTING, "S3020"),
    ("portes_automatiques", "Portes automatiques", SUBCONTRACTING, "S3030"),
    ("portes_coupe_feu", "Portes coupe-feu", SUBCONTRACTING, "S3040"),
    ("ramonage", "Ramonage", SUBCONTRACTING, "S3050"),
    ("relamping", "Relamping", SUBCONTRACTING, "S3060"),
    ("separateur_hydrocarbures", "Séparateur hydrocarbures", SUBCONTRACTING, "S3070"),
    ("sorbonnes", "Sorbonnes", SUBCONTRACTING, "S4000"),
    ("table_elevatrice", "Table élévatrice", SUBCONTRACTING, "S4010"),
    ("telesurveillance", "Télésurveillance", SUBCONTRACTING, "S4020"),
    ("thermographie", "Thermographie", SUBCONTRACTING, "S4030"),
    ("traitement_eau", "Traitement d'eau", SUBCONTRACTING, "S4040"),
    ("video_interphonie", "Vidéo et interphonie", SUBCONTRACTING, "S4050"),
    ("location_echafaudage", "Location échafaudage", RENTALS, "L1010"),
    ("location_groupe_electrogene", "Location groupe électrogène", RENTALS, "L1020"),
    ("location_nacelle", "Location nacelle", RENTALS, "L1030"),
];

/// Built-in prestation definitions, searchable by key or label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrestationCatalog {
    definitions: Vec<PrestationDefinition>,
    index: HashMap<String, usize>,
}

impl PrestationCatalog {
    fn new() -> Self {
        let definitions: Vec<PrestationDefinition> = PRESTATIONS
            .iter()
            .map(|&(key, label, category, budget_code)| PrestationDefinition {
                key,
                label,
                category,
                budget_code,
            })
            .collect();

        let mut index = HashMap::new();
        for (position, definition) in definitions.iter().enumerate() {
            index.insert(normalize_header(definition.key), position);
            index.insert(normalize_header(definition.label), position);
        }

        Self { definitions, index }
    }

    /// Finds a definition from free text typed in a sheet.
    pub fn find(&self, raw: &str) -> Option<&PrestationDefinition> {
        self.index
            .get(&normalize_header(raw))
            .map(|position| &self.definitions[*position])
    }

    pub fn definitions(&self) -> &[PrestationDefinition] {
        &self.definitions
    }
}

/// The schema of every sheet kind, plus shared catalogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schemas {
    clients: SheetSchema,
    services: SheetSchema,
    parts: SheetSchema,
    workload: SheetSchema,
    prestations: PrestationCatalog,
}

impl Default for Schemas {
    fn default() -> Self {
        Self::new()
    }
}

impl Schemas {
    pub fn new() -> Self {
        Self {
            clients: clients_schema(),
            services: services_schema(),
            parts: parts_schema(),
            workload: workload_schema(),
            prestations: PrestationCatalog::new(),
        }
    }

    pub fn schema(&self, kind: SheetKind) -> &SheetSchema {
        match kind {
            SheetKind::Clients => &self.clients,
            SheetKind::Services => &self.services,
            SheetKind::Parts => &self.parts,
            SheetKind::Workload => &self.workload,
        }
    }

    pub fn prestations(&self) -> &PrestationCatalog {
        &self.prestations
    }
}

fn clients_schema() -> SheetSchema {
    let status = ChoiceSet::new(
        &["actif", "inactif"],
        &[
            ("active", "actif"),
            ("oui", "actif"),
            ("true", "actif"),
            ("1", "actif"),
            ("inactive", "inactif"),
            ("non", "inactif"),
            ("false", "inactif"),
            ("0", "inactif"),
        ],
    );
    let depannage = ChoiceSet::new(&["refacturable", "non_refacturable"], &[]);
    let astreinte = ChoiceSet::new(
        &[
            "incluse_non_refacturable",
            "incluse_refacturable",
            "pas_d_astreinte",
        ],
        &[],
    );

    SheetSchema::new(
        SheetKind::Clients,
        &[
            ("company_name", Field::CompanyName),
            ("entreprise", Field::CompanyName),
            ("nom_entreprise", Field::CompanyName),
            ("societe", Field::CompanyName),
            ("raison_sociale", Field::CompanyName),
            ("name", Field::Name),
            ("client", Field::Name),
            ("nom_client", Field::Name),
            ("contact", Field::Name),
            ("email", Field::Email),
            ("mail", Field::Email),
            ("courriel", Field::Email),
            ("phone", Field::Phone),
            ("telephone", Field::Phone),
            ("tel", Field::Phone),
            ("billing_address", Field::BillingAddress),
            ("adresse", Field::BillingAddress),
            ("adresse_facturation", Field::BillingAddress),
            ("depannage", Field::Depannage),
            ("type_depannage", Field::Depannage),
            ("astreinte", Field::Astreinte),
            ("tags", Field::Tags),
            ("tag", Field::Tags),
            ("status", Field::Status),
            ("statut", Field::Status),
        ],
        &[Field::CompanyName, Field::Name],
    )
    .with_kind(Field::Status, FieldKind::Choice(status))
    .with_kind(Field::Depannage, FieldKind::Choice(depannage))
    .with_kind(Field::Astreinte, FieldKind::Choice(astreinte))
    .with_group(
        "contact",
        &[
            ("name", ContactField::Name),
            ("nom", ContactField::Name),
            ("email", ContactField::Email),
            ("mail", ContactField::Email),
            ("courriel", ContactField::Email),
            ("phone", ContactField::Phone),
            ("telephone", ContactField::Phone),
            ("tel", ContactField::Phone),
        ],
    )
}

fn services_schema() -> SheetSchema {
    let status = ChoiceSet::new(
        &["non_commence", "en_cours", "termine"],
        &[
            ("a faire", "non_commence"),
            ("todo", "non_commence"),
            ("not started", "non_commence"),
            ("in progress", "en_cours"),
            ("fait", "termine"),
            ("done", "termine"),
        ],
    );

    SheetSchema::new(
        SheetKind::Services,
        &[
            ("company_name", Field::CompanyName),
            ("entreprise", Field::CompanyName),
            ("nom_entreprise", Field::CompanyName),
            ("societe", Field::CompanyName),
            ("client", Field::Client),
            ("nom_client", Field::Client),
            ("client_name", Field::Client),
            ("prestation", Field::Prestation),
            ("service", Field::Prestation),
            ("type_prestation", Field::Prestation),
            ("categorie", Field::Category),
            ("category", Field::Category),
            ("code_budgetaire", Field::BudgetCode),
            ("code_budget", Field::BudgetCode),
            ("budget_code", Field::BudgetCode),
            ("frequence", Field::Frequency),
            ("frequency", Field::Frequency),
            ("periodicite", Field::Frequency),
            ("intervalle", Field::FrequencyInterval),
            ("interval", Field::FrequencyInterval),
            ("frequency_interval", Field::FrequencyInterval),
            ("unite", Field::FrequencyUnit),
            ("unit", Field::FrequencyUnit),
            ("frequency_unit", Field::FrequencyUnit),
            ("montant", Field::Amount),
            ("budget", Field::Amount),
            ("amount", Field::Amount),
            ("statut", Field::Status),
            ("status", Field::Status),
            ("etat", Field::Status),
        ],
        &[Field::Client, Field::Prestation],
    )
    .with_kind(Field::Status, FieldKind::Choice(status))
    .with_kind(Field::Amount, FieldKind::Decimal)
}

fn parts_schema() -> SheetSchema {
    SheetSchema::new(
        SheetKind::Parts,
        &[
            ("site", Field::Site),
            ("chantier", Field::Site),
            ("equipement", Field::Equipment),
            ("equipment", Field::Equipment),
            ("machine", Field::Equipment),
            ("efficacite", Field::Efficiency),
            ("efficiency", Field::Efficiency),
            ("classe", Field::Efficiency),
            ("type", Field::FilterType),
            ("type_filtre", Field::FilterType),
            ("filter_type", Field::FilterType),
            ("format", Field::FilterType),
            ("dimensions", Field::Dimensions),
            ("dimension", Field::Dimensions),
            ("taille", Field::Dimensions),
            ("quantite", Field::Quantity),
            ("quantity", Field::Quantity),
            ("qte", Field::Quantity),
            ("semaine", Field::OrderWeek),
            ("semaine_commande", Field::OrderWeek),
            ("order_week", Field::OrderWeek),
            ("commande", Field::Ordered),
            ("ordered", Field::Ordered),
        ],
        &[Field::Site, Field::Equipment, Field::FilterType],
    )
    .with_kind(Field::Quantity, FieldKind::Quantity)
    .with_kind(Field::OrderWeek, FieldKind::WeekCode)
    .with_kind(Field::Ordered, FieldKind::Flag)
}

fn workload_schema() -> SheetSchema {
    SheetSchema::new(
        SheetKind::Workload,
        &[
            ("site", Field::Site),
            ("chantier", Field::Site),
            ("nom_site", Field::Site),
            ("site_name", Field::Site),
        ],
        &[Field::Site],
    )
}
