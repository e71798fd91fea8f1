use super::*;
use crate::state::RoastRequest;
use std::future::Future;

/// Everything the AI stage produces for a round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundArtifacts {
    pub combined_image: String,
    pub trivia: TriviaQuestion,
}

async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = AiResult<T>>,
) -> AiResult<T> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| AiError::Timeout(deadline))?
}

/// Combine the sketches, then ask for trivia about the result. Each call gets
/// its own deadline; the first failure ends the stage.
pub async fn run_ai_stage(
    collaborator: &dyn Collaborator,
    sketches: &[Sketch],
    deadline: Duration,
) -> AiResult<RoundArtifacts> {
    tracing::info!(
        "Combining {} sketches with {}",
        sketches.len(),
        collaborator.name()
    );
    let combined_image = with_deadline(deadline, collaborator.combine(sketches)).await?;
    if combined_image.trim().is_empty() {
        return Err(AiError::ParseError("Combined image is empty".to_string()));
    }

    let trivia = with_deadline(deadline, collaborator.trivia_for(&combined_image)).await?;
    if !trivia.is_usable() {
        return Err(AiError::ParseError("Trivia question is unusable".to_string()));
    }

    Ok(RoundArtifacts {
        combined_image,
        trivia,
    })
}

pub async fn run_roast_stage(
    collaborator: &dyn Collaborator,
    request: &RoastRequest,
    deadline: Duration,
) -> AiResult<String> {
    let roast = with_deadline(
        deadline,
        collaborator.roast_for(&request.image, request.judge, &request.nouns),
    )
    .await?;
    if roast.trim().is_empty() {
        return Err(AiError::ParseError("Roast is empty".to_string()));
    }
    Ok(roast)
}
