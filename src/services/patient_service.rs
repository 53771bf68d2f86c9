// src/services/patient_service.rs

use chrono::NaiveDate;
use sqlx::{Connection, PgConnection};

use crate::{
    common::error::AppError,
    db::{activity_repo, ActivityRepository, PatientRepository},
    models::{auth::User, clinic::Patient},
};

#[derive(Debug, Clone)]
pub struct NewPatient<'a> {
    pub name: &'a str,
    pub document: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
}

#[derive(Clone)]
pub struct PatientService {
    repo: PatientRepository,
    activity_repo: ActivityRepository,
}

impl PatientService {
    pub fn new(repo: PatientRepository, activity_repo: ActivityRepository) -> Self {
        Self { repo, activity_repo }
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        search: Option<&str>,
        include_inactive: bool,
    ) -> Result<Vec<Patient>, AppError> {
        self.repo.list(conn, search, include_inactive).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        input: NewPatient<'_>,
    ) -> Result<Patient, AppError> {
        let mut tx = conn.begin().await?;

        let patient = self.repo
            .create(&mut *tx, input.name, input.document, input.birth_date, input.phone, input.email)
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                Some(actor.id),
                activity_repo::ACTIVITY_PATIENT_CREATED,
                &format!("{} cadastrou o paciente {}", actor.name, patient.name),
            )
            .await?;

        tx.commit().await?;

        tracing::info!("🧑 Paciente {} cadastrado", patient.id);
        Ok(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::test_support::{database, Clinic};

    fn named(name: &str) -> NewPatient<'_> {
        NewPatient { name, document: None, birth_date: None, phone: None, email: None }
    }

    #[tokio::test]
    async fn created_patients_can_be_searched() {
        let Some(pool) = database().await else { return };
        let clinic = Clinic::create(pool).await;
        let service = &clinic.state.patient_service;
        let mut conn = clinic.conn().await;

        let maria = service.create(&mut conn, &clinic.admin, named("Maria Souza")).await.unwrap();
        service.create(&mut conn, &clinic.admin, named("João 100%")).await.unwrap();
        service.create(&mut conn, &clinic.admin, named(r"Ana C:\dados")).await.unwrap();

        let found = service.list(&mut conn, Some("souza"), false).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, maria.id);

        // Curingas e barra valem como texto literal
        assert_eq!(service.list(&mut conn, Some("0%"), false).await.unwrap().len(), 1);
        assert_eq!(service.list(&mut conn, Some(r"C:\d"), false).await.unwrap().len(), 1);
        assert_eq!(service.list(&mut conn, None, false).await.unwrap().len(), 3);

        let kinds: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE kind = 'PATIENT_CREATED'")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(kinds, 3);
    }
}
