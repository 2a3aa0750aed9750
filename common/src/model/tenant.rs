use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    M,
    F,
}

impl Gender {
    pub fn honorific(self) -> &'static str {
        match self {
            Gender::F => "Madame",
            Gender::M => "Monsieur",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }

    /// Anything other than `F` is treated as `M`.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("F") {
            Gender::F
        } else {
            Gender::M
        }
    }
}

/// Address of the rented apartment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl ApartmentAddress {
    pub fn formatted(&self) -> String {
        format!("{}, {} {}", self.address, self.city, self.postal_code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub apartment: Option<ApartmentAddress>,
    /// Address stored on the tenant itself by older records.
    #[serde(default)]
    pub address: Option<String>,
}

impl Tenant {
    pub fn honorific(&self) -> &'static str {
        self.gender.honorific()
    }

    /// Apartment address when the tenant is linked to one, else the legacy address.
    pub fn resolved_address(&self) -> String {
        match &self.apartment {
            Some(apartment) => apartment.formatted(),
            None => self.address.clone().unwrap_or_default(),
        }
    }
}

/// Fields needed to register a tenant, optionally linked to an apartment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub apartment_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apartment_address_wins_over_legacy_address() {
        let mut tenant = Tenant {
            id: 1,
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            gender: Gender::M,
            email: None,
            apartment: None,
            address: Some("3 impasse des Lilas".to_string()),
        };
        assert_eq!(tenant.resolved_address(), "3 impasse des Lilas");

        tenant.apartment = Some(ApartmentAddress {
            address: "5 avenue de Paris".to_string(),
            city: "Versailles".to_string(),
            postal_code: "78000".to_string(),
        });
        assert_eq!(tenant.resolved_address(), "5 avenue de Paris, Versailles 78000");
    }

    #[test]
    fn honorific_follows_gender() {
        assert_eq!(Gender::F.honorific(), "Madame");
        assert_eq!(Gender::M.honorific(), "Monsieur");
        assert_eq!(Gender::parse("f"), Gender::F);
        assert_eq!(Gender::parse("X"), Gender::M);
    }
}
