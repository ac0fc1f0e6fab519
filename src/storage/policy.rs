//! Triage config storage: a single row, absent until first saved.

use rusqlite::OptionalExtension;

use crate::model::TriageConfig;

use super::{Result, Storage, StorageError};

impl Storage {
    /// Loads the stored triage config, or `None` if none was ever saved.
    pub fn load_triage_config(&self) -> Result<Option<TriageConfig>> {
        let conn = self.open()?;
        let row = conn
            .query_row(
                "SELECT auto_close_enabled, confidence_threshold, sla_hours
                 FROM triage_config WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, bool>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(auto_close_enabled, confidence_threshold, sla_hours)| {
            let sla_hours = u32::try_from(sla_hours)
                .map_err(|e| StorageError::Corrupt(format!("invalid sla_hours: {e}")))?;
            Ok(TriageConfig {
                auto_close_enabled,
                confidence_threshold,
                sla_hours,
            })
        })
        .transpose()
    }

    /// Replaces the triage config.
    pub fn save_triage_config(&self, config: &TriageConfig) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO triage_config (id, auto_close_enabled, confidence_threshold, sla_hours)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT (id) DO UPDATE SET
                 auto_close_enabled = excluded.auto_close_enabled,
                 confidence_threshold = excluded.confidence_threshold,
                 sla_hours = excluded.sla_hours",
            rusqlite::params![
                config.auto_close_enabled,
                config.confidence_threshold,
                config.sla_hours,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::tests::test_storage;

    #[test]
    fn missing_config_is_none() {
        let (_dir, storage) = test_storage();
        assert!(storage.load_triage_config().unwrap().is_none());
    }

    #[test]
    fn save_then_overwrite() {
        let (_dir, storage) = test_storage();
        let strict = TriageConfig {
            auto_close_enabled: true,
            confidence_threshold: 0.95,
            sla_hours: 8,
        };
        storage.save_triage_config(&strict).unwrap();
        assert_eq!(storage.load_triage_config().unwrap(), Some(strict));

        let disabled = TriageConfig {
            auto_close_enabled: false,
            ..strict
        };
        storage.save_triage_config(&disabled).unwrap();
        assert_eq!(storage.load_triage_config().unwrap(), Some(disabled));
    }
}
