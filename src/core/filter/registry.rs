//! Per-entity filter schemas
//!
//! Column names refer to the aliases used by the list queries in `store`:
//! `a` = counterpart/initiator account, `l` = invite link, `e` = equipment,
//! `c` = chemical, `p` = product, `s` = US state.

/// How a field interprets a search value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer equality
    Id,
    /// Case-insensitive substring
    Text,
    /// Equality against one of the listed canonical values
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub label: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    /// Participates in the `all` fan-out
    pub in_all: bool,
}

impl FieldDef {
    const fn new(label: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            column,
            kind,
            in_all: true,
        }
    }

    const fn specific(label: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            column,
            kind,
            in_all: false,
        }
    }
}

/// Searchable fields of one list query
#[derive(Debug, Clone, Copy)]
pub struct FilterSchema {
    pub entity: &'static str,
    pub fields: &'static [FieldDef],
}

impl FilterSchema {
    pub fn field(&self, label: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.label.eq_ignore_ascii_case(label))
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.label)
    }
}

pub const INVITE_STATUSES: &[&str] = &["NOT_SENT", "PENDING", "ACCEPTED", "REJECTED"];

pub const ROLES: &[&str] = &[
    "GROWER",
    "APPLICATOR",
    "APPLICATOR_USER",
    "WORKER",
    "SUPER_ADMIN",
    "SUPER_ADMIN_USER",
];

pub const PROFILE_STATUSES: &[&str] = &["INCOMPLETE", "COMPLETE", "SUSPENDED"];

pub const EQUIPMENT_TYPES: &[&str] = &[
    "DRONE",
    "AIRPLANE",
    "HELICOPTER",
    "GROUND_RIG",
    "SPRAYER",
    "SPREADER",
];

pub const CHEMICAL_TYPES: &[&str] = &[
    "HERBICIDE",
    "INSECTICIDE",
    "FUNGICIDE",
    "FERTILIZER",
    "ADJUVANT",
];

/// Account fields shared by every relationship list
macro_rules! account_fields {
    ($($extra:expr),* $(,)?) => {
        &[
            FieldDef::new("id", "a.id", FieldKind::Id),
            FieldDef::new("firstName", "a.first_name", FieldKind::Text),
            FieldDef::new("lastName", "a.last_name", FieldKind::Text),
            FieldDef::new("fullName", "a.first_name || ' ' || a.last_name", FieldKind::Text),
            FieldDef::new("businessName", "a.business_name", FieldKind::Text),
            FieldDef::new("email", "a.email", FieldKind::Text),
            FieldDef::new("phone", "a.phone", FieldKind::Text),
            FieldDef::new("address", "a.address", FieldKind::Text),
            FieldDef::new("inviteStatus", "l.invite_status", FieldKind::Enum(INVITE_STATUSES)),
            $($extra),*
        ]
    };
}

/// Workers of an applicator
pub const WORKERS: FilterSchema = FilterSchema {
    entity: "workers",
    fields: account_fields![FieldDef::new("code", "l.code", FieldKind::Text)],
};

/// Team members of an applicator
pub const APPLICATOR_USERS: FilterSchema = FilterSchema {
    entity: "applicator users",
    fields: account_fields![FieldDef::new("code", "l.code", FieldKind::Text)],
};

/// Growers an applicator works with
pub const GROWERS: FilterSchema = FilterSchema {
    entity: "growers",
    fields: account_fields![],
};

/// Applicators seen from the invited side
pub const APPLICATORS: FilterSchema = FilterSchema {
    entity: "applicators",
    fields: account_fields![],
};

/// Admin account directory
pub const ACCOUNTS: FilterSchema = FilterSchema {
    entity: "accounts",
    fields: &[
        FieldDef::new("id", "a.id", FieldKind::Id),
        FieldDef::new("firstName", "a.first_name", FieldKind::Text),
        FieldDef::new("lastName", "a.last_name", FieldKind::Text),
        FieldDef::new("fullName", "a.first_name || ' ' || a.last_name", FieldKind::Text),
        FieldDef::new("businessName", "a.business_name", FieldKind::Text),
        FieldDef::new("email", "a.email", FieldKind::Text),
        FieldDef::new("role", "a.role", FieldKind::Enum(ROLES)),
        FieldDef::new("profileStatus", "a.profile_status", FieldKind::Enum(PROFILE_STATUSES)),
    ],
};

pub const EQUIPMENT: FilterSchema = FilterSchema {
    entity: "equipment",
    fields: &[
        FieldDef::new("id", "e.id", FieldKind::Id),
        FieldDef::new("name", "e.name", FieldKind::Text),
        FieldDef::new("manufacturer", "e.manufacturer", FieldKind::Text),
        FieldDef::new("model", "e.model", FieldKind::Text),
        FieldDef::new("serialNumber", "e.serial_number", FieldKind::Text),
        FieldDef::new("type", "e.equipment_type", FieldKind::Enum(EQUIPMENT_TYPES)),
    ],
};

pub const CHEMICALS: FilterSchema = FilterSchema {
    entity: "chemicals",
    fields: &[
        FieldDef::new("id", "c.id", FieldKind::Id),
        FieldDef::new("name", "c.name", FieldKind::Text),
        FieldDef::new("registrationNumber", "c.registration_number", FieldKind::Text),
        FieldDef::new("manufacturer", "c.manufacturer", FieldKind::Text),
        FieldDef::new("type", "c.chemical_type", FieldKind::Enum(CHEMICAL_TYPES)),
    ],
};

pub const PRODUCTS: FilterSchema = FilterSchema {
    entity: "products",
    fields: &[
        FieldDef::new("id", "p.id", FieldKind::Id),
        FieldDef::new("name", "p.name", FieldKind::Text),
        FieldDef::new("code", "p.code", FieldKind::Text),
        FieldDef::specific("unit", "p.unit", FieldKind::Text),
    ],
};

pub const STATES: FilterSchema = FilterSchema {
    entity: "states",
    fields: &[
        FieldDef::new("id", "s.id", FieldKind::Id),
        FieldDef::new("name", "s.name", FieldKind::Text),
        FieldDef::new("code", "s.code", FieldKind::Text),
    ],
};
