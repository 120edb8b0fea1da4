use chrono::{TimeZone, Utc};
use combo_core::{Database, NewPaper, TagType};
use combo_science::{KeywordDictionary, Linkifier, TagApplier};

fn paper(id: &str, comment: &str, categories: &[&str]) -> NewPaper {
    let mut p = NewPaper::new(id, format!("Paper {id}"), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    p.comment = Some(comment.to_string());
    p.categories = categories.iter().map(|c| c.to_string()).collect();
    p.abstract_text = "Schur functions are related to Schur function theory.".into();
    p.authors = vec!["Ann Author".into()];
    p
}

fn tag_set(db: &Database, paper_id: i64) -> Vec<(String, TagType)> {
    db.tags_for_paper(paper_id)
        .unwrap()
        .into_iter()
        .map(|t| (t.name, t.tag_type))
        .collect()
}

#[test]
fn reingestion_is_idempotent_and_keeps_personal_tags() {
    let db = Database::open_in_memory().unwrap();
    let applier = TagApplier::new();
    let p = paper("2403.00001", "Primary 05E05; Secondary 05A19", &["math.CO", "math.RT"]);

    let first = applier.ingest(&db, &p).unwrap();
    let derived_before = tag_set(&db, first.paper_id);

    db.add_tag("2403.00001", "to-read", TagType::Personal).unwrap();

    let second = applier.ingest(&db, &p).unwrap();
    assert_eq!(first.paper_id, second.paper_id);

    let after = tag_set(&db, second.paper_id);
    let derived_after: Vec<_> = after.iter().filter(|(_, t)| t.is_derived()).cloned().collect();
    assert_eq!(derived_before, derived_after);
    assert!(after.contains(&("to-read".to_string(), TagType::Personal)));
    assert!(!after.iter().any(|(name, _)| name == "math.CO"));
}

#[test]
fn backfill_retags_every_paper() {
    let db = Database::open_in_memory().unwrap();
    // Stored without tags, as papers fetched before tagging existed.
    for (id, comment) in [("2403.00010", "05A15"), ("2403.00011", "MSC 11B65, 05A30")] {
        db.upsert_paper(&paper(id, comment, &["math.CO", "math.NT"])).unwrap();
    }

    let report = TagApplier::new().backfill(&db).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 0);

    let page = db.papers_with_tag("math.NT", TagType::Arxiv, 1, 10).unwrap();
    assert_eq!(page.total, 2);
    let msc = db.list_tags(Some(TagType::Msc)).unwrap();
    let names: Vec<_> = msc.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names.len(), 3);
    for code in ["05A15", "05A30", "11B65"] {
        assert!(names.contains(&code), "{code}");
    }
}

#[test]
fn backfill_failure_keeps_other_papers_retagged() {
    let db = Database::open_in_memory().unwrap();
    let applier = TagApplier::new();
    let ids: Vec<i64> = [("2403.00030", "05A15"), ("2403.00031", "05A17"), ("2403.00032", "05A19")]
        .iter()
        .map(|(id, comment)| applier.ingest(&db, &paper(id, comment, &["math.CO"])).unwrap().paper_id)
        .collect();
    let broken = ids[1];

    // New metadata for every paper; the middle row can no longer be read.
    db.with_connection(|conn| {
        conn.execute(
            "UPDATE papers SET comment = 'MSC 11B65', categories = '[\"math.CO\",\"math.NT\"]'",
            [],
        )?;
        conn.execute("UPDATE papers SET published_date = 'not a date' WHERE id = ?1", [broken])?;
        Ok(())
    })
    .unwrap();

    let report = applier.backfill(&db).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, broken);

    for id in [ids[0], ids[2]] {
        assert_eq!(
            tag_set(&db, id),
            vec![
                ("math.NT".to_string(), TagType::Arxiv),
                ("11B65".to_string(), TagType::Msc),
            ]
        );
    }
    assert_eq!(tag_set(&db, broken), vec![("05A17".to_string(), TagType::Msc)]);
}

#[test]
fn dictionary_file_drives_keyword_tags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keywords.json");
    std::fs::write(
        &path,
        r#"{"Schur functions": {"url": "https://example.org/schur", "tag": "schur", "variants": ["Schur function"]}}"#,
    )
    .unwrap();

    let dict = KeywordDictionary::load(&path).unwrap();
    let linkifier = Linkifier::new(&dict);
    let p = paper("2403.00020", "", &["math.CO"]);

    let linked = linkifier.linkify(&p.abstract_text);
    assert_eq!(linked.html.matches("class=\"keyword-link\"").count(), 1);

    let db = Database::open_in_memory().unwrap();
    let outcome = TagApplier::new().with_linkifier(linkifier).ingest(&db, &p).unwrap();
    assert_eq!(tag_set(&db, outcome.paper_id), vec![("schur".to_string(), TagType::Other)]);
}

#[test]
fn duplicate_variant_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keywords.json");
    std::fs::write(
        &path,
        r#"{
            "parking functions": {"url": "u1", "variants": ["parking function"]},
            "parking function": {"url": "u2"}
        }"#,
    )
    .unwrap();
    let err = KeywordDictionary::load(&path).unwrap_err();
    assert!(err.is_dictionary_error());
}
