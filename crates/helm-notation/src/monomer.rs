use std::fmt::{self, Display, Formatter};

use crate::{MonomerId, MonomerReference, MonomerRole, PolymerType};

// Bracketed codes containing any of these are treated as inline SMILES rather than ad-hoc monomer codes
const SMILES_MARKERS: [char; 9] = ['[', '*', '=', '#', '@', '(', ' ', '|', '$'];

impl PolymerType {
    pub const ALL: [Self; 3] = [Self::Rna, Self::Peptide, Self::Chem];

    /// The prefix naming polymers of this type, like the `RNA` in `RNA1`
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Rna => "RNA",
            Self::Peptide => "PEPTIDE",
            Self::Chem => "CHEM",
        }
    }

    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.prefix() == prefix)
    }

    /// Whether units of this polymer type can carry a branch monomer, like the base in `R(A)P`
    #[must_use]
    pub const fn has_branches(self) -> bool {
        matches!(self, Self::Rna)
    }
}

impl MonomerId {
    /// Classifies the contents of a `[...]` monomer as either an ad-hoc code or an inline SMILES string
    #[must_use]
    pub fn bracketed(code: &str) -> Self {
        let code = code.to_owned();
        if code.contains(&SMILES_MARKERS[..]) {
            Self::Smiles(code)
        } else {
            Self::Bracketed(code)
        }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Symbol(code) | Self::Bracketed(code) | Self::Smiles(code) => code,
        }
    }

    #[must_use]
    pub const fn is_smiles(&self) -> bool {
        matches!(self, Self::Smiles(_))
    }
}

impl Display for MonomerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(code) => write!(f, "{code}"),
            Self::Bracketed(code) | Self::Smiles(code) => write!(f, "[{code}]"),
        }
    }
}

impl MonomerReference {
    #[must_use]
    pub const fn new(polymer_type: PolymerType, id: MonomerId, role: MonomerRole) -> Self {
        Self {
            polymer_type,
            id,
            role,
        }
    }

    #[must_use]
    pub const fn backbone(polymer_type: PolymerType, id: MonomerId) -> Self {
        Self::new(polymer_type, id, MonomerRole::Backbone)
    }

    #[must_use]
    pub const fn branch(polymer_type: PolymerType, id: MonomerId) -> Self {
        Self::new(polymer_type, id, MonomerRole::Branch)
    }

    #[must_use]
    pub const fn polymer_type(&self) -> PolymerType {
        self.polymer_type
    }

    #[must_use]
    pub const fn id(&self) -> &MonomerId {
        &self.id
    }

    #[must_use]
    pub const fn role(&self) -> MonomerRole {
        self.role
    }

    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self.role, MonomerRole::Branch)
    }

    pub(crate) fn with_id(&self, id: MonomerId) -> Self {
        Self { id, ..self.clone() }
    }
}
