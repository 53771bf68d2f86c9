// src/services/appointment_service.rs

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use crate::{
    common::{dates, error::AppError},
    db::{activity_repo, ActivityRepository, AppointmentRepository, ProcedureRepository, ProfessionalRepository},
    models::{
        auth::{User, UserRole},
        scheduling::{Appointment, AppointmentDetail, AppointmentStatus},
    },
};

// Duração usada quando não há procedimento nem horário de término
pub const DEFAULT_APPOINTMENT_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct NewAppointment<'a> {
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub procedure_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct AppointmentService {
    repo: AppointmentRepository,
    procedure_repo: ProcedureRepository,
    professional_repo: ProfessionalRepository,
    activity_repo: ActivityRepository,
    clinic_offset: FixedOffset,
}

impl AppointmentService {
    pub fn new(
        repo: AppointmentRepository,
        procedure_repo: ProcedureRepository,
        professional_repo: ProfessionalRepository,
        activity_repo: ActivityRepository,
        clinic_offset: FixedOffset,
    ) -> Self {
        Self { repo, procedure_repo, professional_repo, activity_repo, clinic_offset }
    }

    pub fn today(&self) -> NaiveDate {
        dates::local_today(self.clinic_offset)
    }

    /// Agenda do dia. Profissionais só enxergam os próprios atendimentos.
    pub async fn list_for_day(
        &self,
        conn: &mut PgConnection,
        date: NaiveDate,
        viewer: &User,
    ) -> Result<Vec<AppointmentDetail>, AppError> {
        let (from, to) = dates::day_bounds(date, self.clinic_offset)?;

        let professional_filter = match viewer.role {
            UserRole::Professional => {
                match self.professional_repo.find_by_user_id(&mut *conn, viewer.id).await? {
                    Some(professional) => Some(professional.id),
                    // Conta sem cadastro de profissional: agenda vazia
                    None => return Ok(Vec::new()),
                }
            }
            UserRole::Admin | UserRole::Receptionist => None,
        };

        self.repo.list_between(&mut *conn, from, to, professional_filter).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        input: NewAppointment<'_>,
    ) -> Result<Appointment, AppError> {
        let mut tx = conn.begin().await?;

        if !self.repo.patient_exists(&mut *tx, input.patient_id).await? {
            return Err(AppError::PatientNotFound);
        }

        if !self.professional_repo.is_active(&mut *tx, input.professional_id).await? {
            return Err(AppError::ProfessionalNotFound);
        }

        let procedure = match input.procedure_id {
            Some(procedure_id) => {
                let procedure = self.procedure_repo
                    .find_by_id(&mut *tx, procedure_id)
                    .await?
                    .filter(|p| p.is_active)
                    .ok_or(AppError::ProcedureNotFound)?;
                Some(procedure)
            }
            None => None,
        };

        let ends_at = resolve_end(
            input.starts_at,
            input.ends_at,
            procedure.as_ref().map(|p| p.duration_minutes),
        );

        lock_professional_agenda(&mut *tx, input.professional_id).await?;

        if self.repo
            .has_overlap(&mut *tx, input.professional_id, input.starts_at, ends_at, None)
            .await?
        {
            return Err(AppError::AppointmentConflict);
        }

        let appointment = self.repo
            .create(
                &mut *tx,
                input.patient_id,
                input.professional_id,
                input.procedure_id,
                input.starts_at,
                ends_at,
                input.notes,
            )
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                Some(actor.id),
                activity_repo::ACTIVITY_APPOINTMENT_CREATED,
                &format!(
                    "{} agendou um atendimento para {}",
                    actor.name,
                    appointment.starts_at.with_timezone(&self.clinic_offset).format("%d/%m/%Y %H:%M")
                ),
            )
            .await?;

        tx.commit().await?;

        Ok(appointment)
    }

    pub async fn update_status(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError> {
        let mut tx = conn.begin().await?;

        let current = self.repo
            .find_by_id(&mut *tx, appointment_id)
            .await?
            .ok_or(AppError::AppointmentNotFound)?;

        if actor.role == UserRole::Professional {
            let own = self.professional_repo
                .find_by_user_id(&mut *tx, actor.id)
                .await?
                .is_some_and(|p| p.id == current.professional_id);
            if !own {
                return Err(AppError::Forbidden);
            }
        }

        if !current.status.can_transition_to(status) {
            return Err(AppError::InvalidStatusTransition {
                from: current.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }

        // O horário pode ter sido ocupado enquanto este atendimento estava liberado
        if current.status.reclaims_slot(status) {
            lock_professional_agenda(&mut *tx, current.professional_id).await?;

            if self.repo
                .has_overlap(
                    &mut *tx,
                    current.professional_id,
                    current.starts_at,
                    current.ends_at,
                    Some(current.id),
                )
                .await?
            {
                return Err(AppError::AppointmentConflict);
            }
        }

        let updated = self.repo.update_status(&mut *tx, appointment_id, status).await?;

        self.activity_repo
            .record(
                &mut *tx,
                Some(actor.id),
                activity_repo::ACTIVITY_APPOINTMENT_STATUS,
                &format!(
                    "{} alterou um atendimento de {} para {}",
                    actor.name,
                    current.status.as_str(),
                    status.as_str()
                ),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }
}

// Serializa mudanças na agenda do mesmo profissional até o commit
async fn lock_professional_agenda(conn: &mut PgConnection, professional_id: Uuid) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(professional_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Término explícito tem prioridade; senão, duração do procedimento; senão, o padrão.
pub fn resolve_end(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    procedure_minutes: Option<i32>,
) -> DateTime<Utc> {
    ends_at.unwrap_or_else(|| {
        let minutes = procedure_minutes
            .map(i64::from)
            .unwrap_or(DEFAULT_APPOINTMENT_MINUTES);
        starts_at + Duration::minutes(minutes)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::common::test_support::{database, Clinic};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 2, h, m, 0).unwrap()
    }

    #[test]
    fn explicit_end_wins() {
        assert_eq!(resolve_end(at(9, 0), Some(at(9, 45)), Some(30)), at(9, 45));
    }

    #[test]
    fn procedure_duration_sets_end() {
        assert_eq!(resolve_end(at(9, 0), None, Some(50)), at(9, 50));
    }

    #[test]
    fn falls_back_to_default_duration() {
        assert_eq!(resolve_end(at(9, 0), None, None), at(9, 30));
    }

    // --- Banco real (TEST_DATABASE_URL) ---

    fn booking(patient_id: Uuid, professional_id: Uuid, starts_at: DateTime<Utc>) -> NewAppointment<'static> {
        NewAppointment {
            patient_id,
            professional_id,
            procedure_id: None,
            starts_at,
            ends_at: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn overlapping_booking_is_a_conflict() {
        let Some(pool) = database().await else { return };
        let clinic = Clinic::create(pool).await;
        let service = &clinic.state.appointment_service;
        let mut conn = clinic.conn().await;
        let patient = clinic.patient(&mut conn).await;
        let professional = clinic.professional(&mut conn, None).await;

        service
            .create(&mut conn, &clinic.admin, booking(patient.id, professional.id, at(12, 0)))
            .await
            .unwrap();

        let clash = service
            .create(&mut conn, &clinic.admin, booking(patient.id, professional.id, at(12, 15)))
            .await;
        assert!(matches!(clash, Err(AppError::AppointmentConflict)));

        // Encostado no fim do anterior não conflita
        service
            .create(&mut conn, &clinic.admin, booking(patient.id, professional.id, at(12, 30)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reviving_a_no_show_over_a_new_booking_is_a_conflict() {
        let Some(pool) = database().await else { return };
        let clinic = Clinic::create(pool).await;
        let service = &clinic.state.appointment_service;
        let mut conn = clinic.conn().await;
        let patient = clinic.patient(&mut conn).await;
        let professional = clinic.professional(&mut conn, None).await;

        let first = service
            .create(&mut conn, &clinic.admin, booking(patient.id, professional.id, at(12, 0)))
            .await
            .unwrap();
        service
            .update_status(&mut conn, &clinic.admin, first.id, AppointmentStatus::NoShow)
            .await
            .unwrap();

        // O horário liberado pela falta pode ser reaproveitado
        service
            .create(&mut conn, &clinic.admin, booking(patient.id, professional.id, at(12, 0)))
            .await
            .unwrap();

        let revived = service
            .update_status(&mut conn, &clinic.admin, first.id, AppointmentStatus::Scheduled)
            .await;
        assert!(matches!(revived, Err(AppError::AppointmentConflict)));

        let live: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM appointments WHERE professional_id = $1 AND status NOT IN ('CANCELLED', 'NO_SHOW')",
        )
            .bind(professional.id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(live, 1);
    }

    #[tokio::test]
    async fn reviving_a_no_show_with_a_free_slot_succeeds() {
        let Some(pool) = database().await else { return };
        let clinic = Clinic::create(pool).await;
        let service = &clinic.state.appointment_service;
        let mut conn = clinic.conn().await;
        let patient = clinic.patient(&mut conn).await;
        let professional = clinic.professional(&mut conn, None).await;

        let appointment = service
            .create(&mut conn, &clinic.admin, booking(patient.id, professional.id, at(9, 0)))
            .await
            .unwrap();
        service
            .update_status(&mut conn, &clinic.admin, appointment.id, AppointmentStatus::NoShow)
            .await
            .unwrap();

        let revived = service
            .update_status(&mut conn, &clinic.admin, appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(revived.status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn terminal_status_cannot_change() {
        let Some(pool) = database().await else { return };
        let clinic = Clinic::create(pool).await;
        let service = &clinic.state.appointment_service;
        let mut conn = clinic.conn().await;
        let patient = clinic.patient(&mut conn).await;
        let professional = clinic.professional(&mut conn, None).await;

        let appointment = service
            .create(&mut conn, &clinic.admin, booking(patient.id, professional.id, at(15, 0)))
            .await
            .unwrap();
        service
            .update_status(&mut conn, &clinic.admin, appointment.id, AppointmentStatus::Completed)
            .await
            .unwrap();

        let reopened = service
            .update_status(&mut conn, &clinic.admin, appointment.id, AppointmentStatus::Scheduled)
            .await;
        assert!(matches!(reopened, Err(AppError::InvalidStatusTransition { .. })));
        assert_eq!(
            AppError::InvalidStatusTransition { from: "COMPLETED".into(), to: "SCHEDULED".into() }
                .status_code(),
            axum::http::StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn professionals_only_see_their_own_agenda() {
        let Some(pool) = database().await else { return };
        let clinic = Clinic::create(pool).await;
        let service = &clinic.state.appointment_service;
        let mut conn = clinic.conn().await;
        let patient = clinic.patient(&mut conn).await;

        let doctor = clinic.user(UserRole::Professional).await;
        let own = clinic.professional(&mut conn, Some(&doctor)).await;
        let other = clinic.professional(&mut conn, None).await;

        service
            .create(&mut conn, &clinic.admin, booking(patient.id, own.id, at(13, 0)))
            .await
            .unwrap();
        service
            .create(&mut conn, &clinic.admin, booking(patient.id, other.id, at(13, 0)))
            .await
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();

        let mine = service.list_for_day(&mut conn, day, &doctor).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].professional_id, own.id);

        let everyone = service.list_for_day(&mut conn, day, &clinic.admin).await.unwrap();
        assert_eq!(everyone.len(), 2);

        // Sem cadastro de profissional: agenda vazia
        let stranger = clinic.user(UserRole::Professional).await;
        assert!(service.list_for_day(&mut conn, day, &stranger).await.unwrap().is_empty());
    }
}
