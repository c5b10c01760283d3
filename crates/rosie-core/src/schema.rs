/// Column names of the analysis frame produced by the adapters.
///
/// These are the names classifiers read. Source datasets use other names
/// (`subquota_description`, `cnpj_cpf`, ...) which the adapters rename.
pub mod columns {
    pub const APPLICANT_ID: &str = "applicant_id";
    pub const CONGRESSPERSON_ID: &str = "congressperson_id";
    pub const DOCUMENT_ID: &str = "document_id";
    pub const DOCUMENT_TYPE: &str = "document_type";
    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
    pub const ISSUE_DATE: &str = "issue_date";
    pub const CATEGORY: &str = "category";
    pub const SUBQUOTA_NUMBER: &str = "subquota_number";
    pub const RECIPIENT_ID: &str = "recipient_id";
    pub const RECIPIENT: &str = "recipient";
    pub const NET_VALUE: &str = "net_value";
    pub const IS_PARTY_EXPENSE: &str = "is_party_expense";

    // Joined from the company registry.
    pub const CNPJ: &str = "cnpj";
    pub const NAME: &str = "name";
    pub const LEGAL_ENTITY: &str = "legal_entity";
    pub const SITUATION: &str = "situation";
    pub const SITUATION_DATE: &str = "situation_date";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
}

/// Arrow schema definitions for the reimbursement analysis frame.
pub mod reimbursements {
    use arrow::datatypes::{DataType, Field, Schema};

    use super::columns;

    /// Declared type of a column in the analysis frame. Anything not listed
    /// stays `Utf8` so identifiers keep their leading zeros.
    pub fn column_type(name: &str) -> DataType {
        match name {
            columns::YEAR | columns::MONTH => DataType::Int64,
            columns::NET_VALUE | columns::LATITUDE | columns::LONGITUDE => DataType::Float64,
            columns::ISSUE_DATE | columns::SITUATION_DATE => DataType::Date32,
            columns::IS_PARTY_EXPENSE => DataType::Boolean,
            _ => DataType::Utf8,
        }
    }

    /// Minimum schema every chamber-of-deputies frame satisfies.
    pub fn analysis_schema() -> Schema {
        Schema::new(vec![
            Field::new(columns::APPLICANT_ID, DataType::Utf8, true),
            Field::new(columns::YEAR, DataType::Int64, true),
            Field::new(columns::MONTH, DataType::Int64, true),
            Field::new(columns::DOCUMENT_ID, DataType::Utf8, true),
            Field::new(columns::DOCUMENT_TYPE, DataType::Utf8, true),
            Field::new(columns::CONGRESSPERSON_ID, DataType::Utf8, true),
            Field::new(columns::IS_PARTY_EXPENSE, DataType::Boolean, false),
            Field::new(columns::CATEGORY, DataType::Utf8, true),
            Field::new(columns::SUBQUOTA_NUMBER, DataType::Utf8, true),
            Field::new(columns::RECIPIENT_ID, DataType::Utf8, true),
            Field::new(columns::RECIPIENT, DataType::Utf8, true),
            Field::new(columns::NET_VALUE, DataType::Float64, true),
            Field::new(columns::ISSUE_DATE, DataType::Date32, true),
            Field::new(columns::LEGAL_ENTITY, DataType::Utf8, true),
            Field::new(columns::SITUATION, DataType::Utf8, true),
            Field::new(columns::SITUATION_DATE, DataType::Date32, true),
            Field::new(columns::LATITUDE, DataType::Float64, true),
            Field::new(columns::LONGITUDE, DataType::Float64, true),
        ])
    }
}

/// Schema for the suspicions table written at the end of a run.
pub mod suspicions {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Key fields followed by one non-null Boolean field per classifier.
    pub fn suspicions_schema(keys: &[Field], classifiers: &[&str]) -> Schema {
        let mut fields: Vec<Field> = keys.to_vec();
        fields.extend(
            classifiers
                .iter()
                .map(|name| Field::new(*name, DataType::Boolean, false)),
        );
        Schema::new(fields)
    }
}
