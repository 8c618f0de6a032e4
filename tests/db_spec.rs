use chrono::{DateTime, Utc};
use halflife::db::Database;
use halflife::models::*;
use speculate2::speculate;

fn instant(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("Invalid test timestamp")
        .with_timezone(&Utc)
}

fn new_dose(amount: f64, timestamp: &str) -> NewDose {
    NewDose {
        amount,
        timestamp: instant(timestamp),
        note: None,
    }
}

fn create_test_dose(db: &Database, user_id: &str, amount: f64, timestamp: &str) -> Dose {
    db.create_dose(user_id, new_dose(amount, timestamp))
        .expect("Failed to create dose")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "doses" {
        describe "create_dose" {
            it "assigns an id and keeps the fields" {
                let dose = db.create_dose("alice", NewDose {
                    amount: 2.5,
                    timestamp: instant("2024-02-10T08:00:00Z"),
                    note: Some("left thigh".to_string()),
                }).expect("Failed to create dose");

                assert!(!dose.id.is_empty());
                assert_eq!(dose.amount, 2.5);
                assert_eq!(dose.timestamp, instant("2024-02-10T08:00:00Z"));
                assert_eq!(dose.note, Some("left thigh".to_string()));
            }

            it "gives every dose its own id" {
                let a = create_test_dose(&db, "alice", 1.0, "2024-02-10T08:00:00Z");
                let b = create_test_dose(&db, "alice", 1.0, "2024-02-10T08:00:00Z");
                assert_ne!(a.id, b.id);
            }

            it "stores timestamps at millisecond precision" {
                let dose = create_test_dose(&db, "alice", 1.0, "2024-02-10T08:00:00.123456Z");
                assert_eq!(dose.timestamp, instant("2024-02-10T08:00:00.123Z"));

                let stored = db.get_dose("alice", &dose.id).expect("Query failed").unwrap();
                assert_eq!(stored.timestamp, dose.timestamp);
            }
        }

        describe "get_dose" {
            it "returns None for an unknown id" {
                let result = db.get_dose("alice", "missing").expect("Query failed");
                assert!(result.is_none());
            }

            it "returns the dose by id" {
                let created = create_test_dose(&db, "alice", 3.0, "2024-02-10T08:00:00Z");

                let found = db.get_dose("alice", &created.id).expect("Query failed");
                assert_eq!(found, Some(created));
            }

            it "does not return another user's dose" {
                let created = create_test_dose(&db, "alice", 3.0, "2024-02-10T08:00:00Z");

                let found = db.get_dose("bob", &created.id).expect("Query failed");
                assert!(found.is_none());
            }
        }

        describe "list_doses" {
            it "returns an empty list for a new user" {
                let doses = db.list_doses("alice").expect("Query failed");
                assert!(doses.is_empty());
            }

            it "returns doses newest first" {
                create_test_dose(&db, "alice", 1.0, "2024-02-03T08:00:00Z");
                create_test_dose(&db, "alice", 3.0, "2024-02-10T08:00:00Z");
                create_test_dose(&db, "alice", 2.0, "2024-02-07T08:00:00Z");

                let doses = db.list_doses("alice").expect("Query failed");
                let amounts: Vec<f64> = doses.iter().map(|d| d.amount).collect();
                assert_eq!(amounts, vec![3.0, 2.0, 1.0]);
            }

            it "orders by instant regardless of the submitted offset" {
                db.create_dose("alice", NewDose {
                    amount: 1.0,
                    timestamp: DateTime::parse_from_rfc3339("2024-02-10T09:00:00+05:00")
                        .unwrap()
                        .with_timezone(&Utc),
                    note: None,
                }).expect("Failed to create dose");
                create_test_dose(&db, "alice", 2.0, "2024-02-10T06:00:00Z");

                let doses = db.list_doses("alice").expect("Query failed");
                assert_eq!(doses[0].amount, 2.0);
                assert_eq!(doses[1].timestamp, instant("2024-02-10T04:00:00Z"));
            }

            it "keeps each user's log separate" {
                create_test_dose(&db, "alice", 1.0, "2024-02-10T08:00:00Z");
                create_test_dose(&db, "bob", 2.0, "2024-02-10T08:00:00Z");
                create_test_dose(&db, "bob", 3.0, "2024-02-11T08:00:00Z");

                assert_eq!(db.list_doses("alice").expect("Query failed").len(), 1);
                assert_eq!(db.list_doses("bob").expect("Query failed").len(), 2);
            }
        }

        describe "update_dose" {
            it "replaces amount, timestamp and note" {
                let created = create_test_dose(&db, "alice", 2.0, "2024-02-10T08:00:00Z");

                let updated = db.update_dose("alice", &created.id, ValidDose {
                    amount: 2.5,
                    timestamp: Some(instant("2024-02-09T20:00:00Z")),
                    note: Some("corrected".to_string()),
                }).expect("Update failed").expect("Dose not found");

                assert_eq!(updated.id, created.id);
                assert_eq!(updated.amount, 2.5);
                assert_eq!(updated.timestamp, instant("2024-02-09T20:00:00Z"));
                assert_eq!(updated.note, Some("corrected".to_string()));

                let stored = db.get_dose("alice", &created.id).expect("Query failed");
                assert_eq!(stored, Some(updated));
            }

            it "keeps the stored timestamp when none is given" {
                let created = create_test_dose(&db, "alice", 2.0, "2024-02-10T08:00:00Z");

                let updated = db.update_dose("alice", &created.id, ValidDose {
                    amount: 4.0,
                    timestamp: None,
                    note: None,
                }).expect("Update failed").expect("Dose not found");

                assert_eq!(updated.timestamp, created.timestamp);
                assert_eq!(updated.amount, 4.0);
            }

            it "clears the note when none is given" {
                let created = db.create_dose("alice", NewDose {
                    note: Some("old".to_string()),
                    ..new_dose(2.0, "2024-02-10T08:00:00Z")
                }).expect("Failed to create dose");

                let updated = db.update_dose("alice", &created.id, ValidDose {
                    amount: 2.0,
                    timestamp: None,
                    note: None,
                }).expect("Update failed").expect("Dose not found");

                assert!(updated.note.is_none());
            }

            it "returns None for an unknown id" {
                let result = db.update_dose("alice", "missing", ValidDose {
                    amount: 1.0,
                    timestamp: None,
                    note: None,
                }).expect("Update failed");
                assert!(result.is_none());
            }

            it "does not touch another user's dose" {
                let created = create_test_dose(&db, "alice", 2.0, "2024-02-10T08:00:00Z");

                let result = db.update_dose("bob", &created.id, ValidDose {
                    amount: 9.0,
                    timestamp: None,
                    note: None,
                }).expect("Update failed");

                assert!(result.is_none());
                let stored = db.get_dose("alice", &created.id).expect("Query failed").unwrap();
                assert_eq!(stored.amount, 2.0);
            }
        }

        describe "delete_dose" {
            it "removes the dose" {
                let created = create_test_dose(&db, "alice", 2.0, "2024-02-10T08:00:00Z");
                let kept = create_test_dose(&db, "alice", 1.0, "2024-02-09T08:00:00Z");

                assert!(db.delete_dose("alice", &created.id).expect("Delete failed"));

                let doses = db.list_doses("alice").expect("Query failed");
                assert_eq!(doses, vec![kept]);
            }

            it "returns false for an unknown id" {
                create_test_dose(&db, "alice", 2.0, "2024-02-10T08:00:00Z");

                assert!(!db.delete_dose("alice", "missing").expect("Delete failed"));
                assert_eq!(db.list_doses("alice").expect("Query failed").len(), 1);
            }

            it "returns false for another user's dose" {
                let created = create_test_dose(&db, "alice", 2.0, "2024-02-10T08:00:00Z");
                assert!(!db.delete_dose("bob", &created.id).expect("Delete failed"));
            }
        }

        describe "stored_doses" {
            it "returns rows with their stored text" {
                let created = db.create_dose("alice", NewDose {
                    note: Some("evening".to_string()),
                    ..new_dose(2.0, "2024-02-10T08:00:00+02:00")
                }).expect("Failed to create dose");
                create_test_dose(&db, "bob", 1.0, "2024-02-10T08:00:00Z");

                let rows = db.stored_doses("alice").expect("Query failed");

                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].id, created.id);
                assert_eq!(rows[0].amount, 2.0);
                assert_eq!(rows[0].timestamp, "2024-02-10T06:00:00.000Z");
                assert_eq!(rows[0].note, Some("evening".to_string()));
                assert!(!rows[0].created_at.is_empty());
            }
        }

        describe "clear_doses" {
            it "removes every dose of the user and reports the count" {
                create_test_dose(&db, "alice", 1.0, "2024-02-09T08:00:00Z");
                create_test_dose(&db, "alice", 2.0, "2024-02-10T08:00:00Z");
                create_test_dose(&db, "bob", 3.0, "2024-02-10T08:00:00Z");

                assert_eq!(db.clear_doses("alice").expect("Clear failed"), 2);
                assert!(db.list_doses("alice").expect("Query failed").is_empty());
                assert_eq!(db.list_doses("bob").expect("Query failed").len(), 1);
            }

            it "is a no-op on an empty log" {
                assert_eq!(db.clear_doses("alice").expect("Clear failed"), 0);
            }
        }
    }

    describe "on disk" {
        it "persists doses across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("halflife.db");

            let created = {
                let disk = Database::open(path.clone()).expect("Failed to open database");
                disk.migrate().expect("Failed to run migrations");
                create_test_dose(&disk, "alice", 2.0, "2024-02-10T08:00:00Z")
            };

            let reopened = Database::open(path).expect("Failed to reopen database");
            reopened.migrate().expect("Migrations should be idempotent");
            let doses = reopened.list_doses("alice").expect("Query failed");
            assert_eq!(doses, vec![created]);
        }
    }
}
