//! Read path: scoped nearest-chunk lookup followed by answer generation.

use std::sync::Arc;

use reporag_llm::{LlmProvider, Message};
use reporag_store::{ChunkStore, Scope, TextChunk};

use crate::embedder::Embedder;
use crate::error::Result;
use crate::search::nearest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchReason {
    /// The store holds no chunks in any scope; nothing was embedded.
    EmptyStore,
    /// The store has chunks, but none in the requested scope.
    EmptyScope,
}

#[derive(Debug)]
pub enum Retrieval {
    NoMatch(NoMatchReason),
    Answer {
        chunk: TextChunk,
        distance: f32,
        answer: String,
    },
}

pub struct Retriever<P: LlmProvider> {
    provider: Arc<P>,
    embedder: Embedder<P>,
    store: Arc<dyn ChunkStore>,
}

impl<P: LlmProvider> Retriever<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, store: Arc<dyn ChunkStore>) -> Self {
        Self {
            embedder: Embedder::new(Arc::clone(&provider), store.dimensions()),
            provider,
            store,
        }
    }

    /// Answer `prompt` from the single closest chunk in `scope`.
    ///
    /// # Errors
    ///
    /// Propagates store, embedding and chat failures unchanged.
    pub async fn retrieve(&self, scope: &Scope, prompt: &str) -> Result<Retrieval> {
        if self.store.count_all().await? == 0 {
            tracing::debug!(%scope, "store is empty, skipping retrieval");
            return Ok(Retrieval::NoMatch(NoMatchReason::EmptyStore));
        }

        let query = self.embedder.embed(prompt).await?;
        let mut chunks = self.store.query(scope).await?;
        if chunks.is_empty() {
            tracing::debug!(%scope, "no chunks in scope");
            return Ok(Retrieval::NoMatch(NoMatchReason::EmptyScope));
        }

        let embeddings: Vec<&[f32]> = chunks.iter().map(|c| c.embedding.as_slice()).collect();
        let Some(best) = nearest(&embeddings, &query, 1)?.into_iter().next() else {
            return Ok(Retrieval::NoMatch(NoMatchReason::EmptyScope));
        };
        let candidates = chunks.len();
        let chunk = chunks.swap_remove(best.index);
        tracing::debug!(
            %scope,
            candidates,
            file = %chunk.path,
            distance = best.distance,
            "nearest chunk selected"
        );

        let answer = self
            .provider
            .chat(&answer_messages(&chunk.text, &chunk.file_name, prompt))
            .await?;

        Ok(Retrieval::Answer {
            chunk,
            distance: best.distance,
            answer,
        })
    }
}

fn answer_messages(code: &str, file_name: &str, prompt: &str) -> [Message; 2] {
    [
        Message::system(format!(
            "Respond to the user's question with the provided code segment if relevant. \
             If the code segment is not sufficient to answer the question, provide the best \
             possible response. Include the file name in your response. \
             Here is the code segment: {code}. Here is the file name: {file_name}."
        )),
        Message::user(prompt),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use reporag_llm::mock::MockProvider;
    use reporag_store::{InMemoryChunkStore, NewTextChunk};

    #[test]
    fn answer_prompt_names_code_and_file() {
        let [system, user] = answer_messages("fn a() {}", "a.rs", "what is a?");
        assert!(
            system
                .content
                .ends_with("Here is the code segment: fn a() {}. Here is the file name: a.rs.")
        );
        assert!(system.content.starts_with("Respond to the user's question"));
        assert!(system.content.contains("best possible response. Include the file name"));
        assert_eq!(user.content, "what is a?");
    }

    #[tokio::test]
    async fn selects_nearest_and_generates_answer() {
        let store = Arc::new(InMemoryChunkStore::new(2));
        for (text, v) in [("one", [1.0_f32, 0.0]), ("two", [0.0, 1.0])] {
            store
                .put(NewTextChunk {
                    scope: Scope::new("r", "b"),
                    file_name: format!("{text}.rs"),
                    path: format!("src/{text}.rs"),
                    context: String::new(),
                    text: text.into(),
                    embedding: v.to_vec(),
                })
                .await
                .unwrap();
        }
        let mock = MockProvider::with_responses(vec!["It is two.".into()])
            .with_embeddings(vec![vec![0.1, 0.8]]);
        let retriever = Retriever::new(Arc::new(mock.clone()), store);

        let Retrieval::Answer { chunk, answer, .. } =
            retriever.retrieve(&Scope::new("r", "b"), "which?").await.unwrap()
        else {
            panic!("expected an answer");
        };
        assert_eq!(chunk.text, "two");
        assert_eq!(answer, "It is two.");
        let history = mock.chat_history();
        assert!(history[0][0].content.contains("Here is the file name: two.rs."));
        assert_eq!(history[0][1].content, "which?");
    }

    #[tokio::test]
    async fn query_embedding_of_wrong_length_errors() {
        let store = Arc::new(InMemoryChunkStore::new(2));
        store
            .put(NewTextChunk {
                scope: Scope::new("r", "b"),
                file_name: "a.rs".into(),
                path: "a.rs".into(),
                context: String::new(),
                text: "a".into(),
                embedding: vec![1.0, 1.0],
            })
            .await
            .unwrap();
        let mock = MockProvider::default();
        let retriever = Retriever::new(Arc::new(mock.clone()), store);
        assert!(retriever.retrieve(&Scope::new("r", "b"), "q").await.is_err());
        assert_eq!(mock.chat_calls(), 0);
    }
}
