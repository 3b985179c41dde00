//! The basic operations tour: index a sample document, delete it, query the corpus, then
//! create and delete a scratch corpus. Every step prints its outcome; the first hard
//! failure ends the run.
use crate::formatter::FormattedString;
use crate::session::Session;
use anyhow::{Context, bail};
use colored::*;
use vectara_core::interpret::{Extracted, Outcome};
use vectara_core::operation::{Document, NewCorpus, Operation, QueryBatch, Section};

const SAMPLE_DOCUMENT_ID: &str = "walkthrough-doc-1";
const SAMPLE_QUERY: &str = "What is the meaning of life?";
const STEPS: usize = 5;

pub async fn run(session: &mut Session, corpus_id: i64) -> anyhow::Result<()> {
    let index = Operation::IndexDocument(sample_document());
    report(1, "Index a document", session.corpus(corpus_id, &index).await?)?;

    let delete_doc = Operation::DeleteDocument {
        document_id: SAMPLE_DOCUMENT_ID.to_string(),
    };
    report(2, "Delete the document", session.corpus(corpus_id, &delete_doc).await?)?;

    let query = QueryBatch::single(SAMPLE_QUERY, 10, session.customer_id(), corpus_id);
    report(3, "Query the corpus", session.query(query).await?)?;

    let create = Operation::CreateCorpus(NewCorpus {
        name: "Vectara Rust Walkthrough".to_string(),
        description: "Scratch corpus created by the walkthrough".to_string(),
    });
    let created = report(4, "Create a corpus", session.account(&create).await?)?;
    let Some(Extracted::CorpusId(scratch_id)) = created.extracted().cloned() else {
        bail!("create-corpus answered without a corpus id");
    };

    report(
        5,
        "Delete the new corpus",
        session.corpus(scratch_id, &Operation::DeleteCorpus).await?,
    )
    .with_context(|| format!("corpus {scratch_id} was left behind"))?;

    Ok(())
}

fn sample_document() -> Document {
    Document {
        document_id: SAMPLE_DOCUMENT_ID.to_string(),
        title: "An example document".to_string(),
        description: "Indexed by the vectara walkthrough".to_string(),
        metadata_json: r#"{"source":"walkthrough"}"#.to_string(),
        sections: vec![
            Section {
                title: "Lorem ipsum".to_string(),
                ..Section::text("The answer to the ultimate question of life is forty-two.")
            },
            Section::text("Vectara indexes text and answers questions over it."),
        ],
    }
}

fn report(step: usize, label: &str, outcome: Outcome) -> anyhow::Result<Outcome> {
    println!("{} {}", format!("[{step}/{STEPS}]").dimmed(), label.bold());
    println!("{}", FormattedString::from(&outcome));

    if outcome.is_failure() {
        bail!("step {step} ({label}) failed");
    }
    Ok(outcome)
}
