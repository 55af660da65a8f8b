use std::path::Path;
use std::sync::Arc;

use scribe_core::agent::{Agent, AgentState, EXHAUSTED_FALLBACK};
use scribe_core::tools::{NotesSearchExecutor, QUERY_NOTES_TOOL};
use scribe_index::indexer::{IndexerConfig, NotesIndexer};
use scribe_index::{IndexHandle, LoadedIndex, Retriever};
use scribe_llm::mock::MockProvider;
use scribe_llm::provider::{ChatOptions, Message, Role};

fn indexer(provider: &Arc<MockProvider>) -> NotesIndexer<MockProvider> {
    NotesIndexer::from_provider(Arc::clone(provider), 100, IndexerConfig::default())
}

fn agent(
    provider: &Arc<MockProvider>,
    handle: IndexHandle,
    max_iterations: usize,
) -> Agent<MockProvider, NotesSearchExecutor<MockProvider>> {
    let retriever = Retriever::from_provider(Arc::clone(provider), 100, handle);
    Agent::new(
        Arc::clone(provider),
        NotesSearchExecutor::new(retriever, 5),
        max_iterations,
    )
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

#[tokio::test]
async fn long_note_splits_into_two_overlapping_chunks() {
    let notes = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let body: String = ('a'..='z').cycle().take(600).collect();
    write(notes.path(), "long.md", &body);

    let provider = Arc::new(MockProvider::default());
    let index_path = out.path().join("notes.index");
    let metadata_path = out.path().join("notes.json");
    let (built, report) = indexer(&provider)
        .build_and_persist(notes.path(), &index_path, &metadata_path)
        .await
        .unwrap();
    let built = built.unwrap();
    assert_eq!(report.chunks, 2);
    assert_eq!(built.len(), 2);

    let loaded = LoadedIndex::load(&index_path, &metadata_path).await.unwrap();
    assert_eq!(loaded.index().len(), loaded.metadata().len());
    let records = loaded.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text, body[..500]);
    assert_eq!(records[1].text, body[450..]);
    assert!(records.iter().all(|r| r.total_chunks == 2));
    assert_eq!(records[1].chunk_index, 1);
}

#[tokio::test]
async fn phrase_from_first_chunk_ranks_chunk_zero_first() {
    let notes = tempfile::tempdir().unwrap();
    let head: String = "Ownership rules: each value has exactly one owner. "
        .chars()
        .cycle()
        .take(450)
        .collect();
    let tail: String = "Lifetimes annotate how long references stay valid. "
        .chars()
        .cycle()
        .take(150)
        .collect();
    let body = format!("{head}{tail}");
    assert_eq!(body.chars().count(), 600);
    write(notes.path(), "A.md", &body);

    let provider = Arc::new(MockProvider::default());
    let (loaded, _) = indexer(&provider).build(notes.path()).await.unwrap();
    let retriever =
        Retriever::from_provider(Arc::clone(&provider), 100, IndexHandle::with_index(loaded));

    // Five requested, two rows stored: every row comes back.
    let hits = retriever.retrieve(&body[..40], 5).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk_index, 0);
    assert_eq!(hits[1].chunk_index, 1);
    assert!(hits[0].score > hits[1].score);
    assert!(hits.iter().all(|h| h.file_path.ends_with("A.md") && h.total_chunks == 2));
}

#[tokio::test]
async fn indexed_chunk_is_its_own_top_hit() {
    let notes = tempfile::tempdir().unwrap();
    write(notes.path(), "a.md", "Borrow checker rules for mutable references.");
    write(notes.path(), "b.md", "Sourdough starter needs feeding twice a day.");
    write(notes.path(), "c.md", "Kubernetes pods restart on liveness failure.");

    let provider = Arc::new(MockProvider::default());
    let (loaded, _) = indexer(&provider).build(notes.path()).await.unwrap();
    let handle = IndexHandle::with_index(loaded);
    let retriever = Retriever::from_provider(Arc::clone(&provider), 100, handle);

    let hits = retriever
        .retrieve("Sourdough starter needs feeding twice a day.", 3)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits[0].file_path.ends_with("b.md"));
    assert_eq!(hits[0].chunk_index, 0);
    assert!(hits[0].score > 0.99);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn agent_searches_then_answers() {
    let notes = tempfile::tempdir().unwrap();
    write(notes.path(), "tokio.md", "Tokio tasks are cooperatively scheduled.");

    let index_provider = Arc::new(MockProvider::default());
    let (loaded, _) = indexer(&index_provider).build(notes.path()).await.unwrap();

    let provider = Arc::new(MockProvider::with_responses(vec![
        MockProvider::tool_calls(&[(
            "call_1",
            QUERY_NOTES_TOOL,
            r#"{"query":"Tokio tasks are cooperatively scheduled."}"#,
        )]),
        MockProvider::text("Tokio tasks yield cooperatively (tokio.md)."),
    ]));
    let reply = agent(&provider, IndexHandle::with_index(loaded), 5)
        .run(vec![Message::user("how does tokio schedule?")], &ChatOptions::default())
        .await
        .unwrap();

    assert_eq!(reply.state, AgentState::Done);
    assert_eq!(reply.iterations, 1);
    assert_eq!(reply.message.content, "Tokio tasks yield cooperatively (tokio.md).");
    assert_eq!(provider.chat_calls(), 2);

    let transcripts = provider.transcripts();
    let second = &transcripts[1];
    let tool_msg = second.last().unwrap();
    assert_eq!(tool_msg.role, Role::Tool);
    assert!(tool_msg.content.contains("Result 1 (similarity:"));
    assert!(tool_msg.content.contains("tokio.md"));
    assert!(tool_msg.content.contains("Chunk 1/1"));
}

#[tokio::test]
async fn empty_index_reports_no_results_to_the_model() {
    let empty = tempfile::tempdir().unwrap();
    let index_provider = Arc::new(MockProvider::default());
    let (loaded, report) = indexer(&index_provider).build(empty.path()).await.unwrap();
    assert_eq!(report.files_found, 0);
    assert!(loaded.is_empty());

    let provider = Arc::new(MockProvider::with_responses(vec![
        MockProvider::tool_calls(&[("call_1", QUERY_NOTES_TOOL, r#"{"query":"anything"}"#)]),
        MockProvider::text("Your notes do not cover that."),
    ]));
    let reply = agent(&provider, IndexHandle::with_index(loaded), 5)
        .run(vec![Message::user("anything?")], &ChatOptions::default())
        .await
        .unwrap();
    assert_eq!(reply.state, AgentState::Done);

    let transcripts = provider.transcripts();
    let tool_msg = transcripts[1].last().unwrap();
    assert_eq!(tool_msg.content, "No results found for query: 'anything'");
}

#[tokio::test]
async fn agent_stops_at_iteration_cap() {
    let provider = Arc::new(MockProvider::repeating(MockProvider::tool_calls(&[(
        "call_x",
        QUERY_NOTES_TOOL,
        r#"{"query":"loop"}"#,
    )])));
    let reply = agent(&provider, IndexHandle::new(), 3)
        .run(vec![Message::user("loop forever")], &ChatOptions::default())
        .await
        .unwrap();

    assert_eq!(reply.state, AgentState::Exhausted);
    assert_eq!(reply.iterations, 3);
    assert_eq!(provider.chat_calls(), 3);
    assert_eq!(reply.message.content, EXHAUSTED_FALLBACK);

    // Without an index the tool reports the failure back instead of aborting.
    let transcripts = provider.transcripts();
    let tool_msg = transcripts[1].last().unwrap();
    assert!(tool_msg.content.starts_with("Error executing query_my_notes:"));
}
