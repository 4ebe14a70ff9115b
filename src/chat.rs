use dialoguer::Input;
use docent_core::Assistant;
use docent_core::format::format_elapsed;
use docent_llm::ModelConfig;
use tokio_util::sync::CancellationToken;

use crate::{print_result, report};

const EXIT_WORDS: [&str; 4] = ["exit", "quit", "salir", ":q"];

/// Read questions until EOF or an exit word. Ctrl-C while waiting for an answer cancels it.
pub async fn run(assistant: &Assistant, selection: ModelConfig) -> anyhow::Result<()> {
    eprintln!(
        "docent chat · {} / {} · type `exit` or press Ctrl-D to leave",
        selection.provider, selection.model_name
    );

    let mut asked = 0usize;
    loop {
        let Some(question) = read_question(asked + 1).await? else {
            break;
        };
        let question = question.trim().to_owned();
        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
            break;
        }
        asked += 1;

        let cancel = CancellationToken::new();
        let query = assistant.submit_query(&question, &selection, &cancel);
        tokio::pin!(query);

        let outcome = tokio::select! {
            result = &mut query => result,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                query.await
            }
        };

        match outcome {
            Ok(result) => {
                print_result(&result, false);
                tracing::debug!(elapsed = %format_elapsed(result.elapsed()), "answered");
            }
            Err(e) => report(&e),
        }
        println!();
    }
    Ok(())
}

/// `None` on EOF (Ctrl-D) or a closed terminal.
async fn read_question(number: usize) -> anyhow::Result<Option<String>> {
    let line = tokio::task::spawn_blocking(move || {
        Input::<String>::new()
            .with_prompt(format!("[{number}] Pregunta"))
            .allow_empty(true)
            .interact_text()
    })
    .await?;

    match line {
        Ok(text) => Ok(Some(text)),
        Err(e) => {
            tracing::debug!("input closed: {e}");
            Ok(None)
        }
    }
}
