// src/db/patient_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};

use crate::{
    common::{db_utils::like_pattern, error::AppError},
    models::clinic::Patient,
};

// Schema do tenant: recebe a conexão já trocada
#[derive(Clone, Default)]
pub struct PatientRepository;

impl PatientRepository {
    pub fn new() -> Self {
        Self
    }

    /// Busca por nome ou documento.
    pub async fn list<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
        include_inactive: bool,
    ) -> Result<Vec<Patient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let patients = sqlx::query_as::<_, Patient>(
            r#"
            SELECT * FROM patients
            WHERE ($1::text IS NULL OR name ILIKE $1 OR document ILIKE $1)
              AND ($2 OR is_active = true)
            ORDER BY name ASC
            "#,
        )
            .bind(like_pattern(search))
            .bind(include_inactive)
            .fetch_all(executor)
            .await?;

        Ok(patients)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        document: Option<&str>,
        birth_date: Option<NaiveDate>,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Patient, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (name, document, birth_date, phone, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(document)
            .bind(birth_date)
            .bind(phone)
            .bind(email)
            .fetch_one(executor)
            .await?;

        Ok(patient)
    }
}
