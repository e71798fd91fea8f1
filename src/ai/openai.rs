use super::*;
use crate::media::{svg_data_url, svg_markup};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessageContentPartImage, ChatCompletionRequestMessageContentPartText,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use std::time::Instant;

const COMBINE_SYSTEM_PROMPT: &str = "You are the art department of a chaotic party game. \
    Players drew quick sketches from silly prompts and you merge them into one scene.";

const SVG_INSTRUCTIONS: &str = "Generate a valid, standalone SVG string (starting with <svg and \
    ending with </svg>) that depicts this scene. The SVG should be highly detailed, colorful, and \
    visually interesting. Do not use markdown blocks. Just the SVG code.";

const TRIVIA_PROMPT: &str = "Look at this image. Create a funny, specific multiple-choice \
    question about a detail in the image (e.g. 'What is the robot holding?' or 'What color is \
    the frog?'). Provide 4 options, one correct. Return only JSON matching this schema: \
    { \"question\": string, \"options\": string[], \"correctIndex\": number }";

pub struct OpenAiCollaborator {
    client: Client<OpenAIConfig>,
    model: String,
    combine_backend: Option<CombineBackend>,
}

impl OpenAiCollaborator {
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model,
            combine_backend: None,
        }
    }

    pub fn with_combine_backend(mut self, backend: CombineBackend) -> Self {
        self.combine_backend = Some(backend);
        self
    }

    /// Vision models do not take SVG, so vector images go in as markup
    fn image_part(url: &str) -> ChatCompletionRequestUserMessageContentPart {
        match svg_markup(url) {
            Some(svg) => ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: format!("The image, as SVG markup:\n{svg}"),
                },
            ),
            None => ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: url.to_string(),
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
        }
    }

    fn text_part(text: impl Into<String>) -> ChatCompletionRequestUserMessageContentPart {
        ChatCompletionRequestUserMessageContentPart::Text(
            ChatCompletionRequestMessageContentPartText { text: text.into() },
        )
    }

    async fn chat(
        &self,
        system: &str,
        parts: Vec<ChatCompletionRequestUserMessageContentPart>,
        max_tokens: u32,
    ) -> AiResult<String> {
        let start = Instant::now();

        let user_message = ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Array(parts),
            name: None,
        };

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(max_tokens)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| AiError::ApiError(e.to_string()))?
                    .into(),
                user_message.into(),
            ])
            .build()
            .map_err(|e| AiError::ApiError(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| AiError::ApiError(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AiError::ParseError("No content in response".to_string()))?;

        tracing::debug!(
            "OpenAI {} replied in {}ms ({} tokens)",
            self.model,
            start.elapsed().as_millis(),
            response.usage.map(|u| u.total_tokens).unwrap_or(0)
        );
        Ok(text.trim().to_string())
    }

    async fn combine_with_openai(&self, sketches: &[Sketch]) -> AiResult<String> {
        let descriptions = sketches
            .iter()
            .enumerate()
            .map(|(i, s)| format!("Character/Object {} is a {}", i + 1, s.describe()))
            .collect::<Vec<_>>()
            .join(". ");

        let mut parts: Vec<_> = sketches.iter().map(|s| Self::image_part(&s.image)).collect();
        parts.push(Self::text_part(format!(
            "Create a hilarious, high-stakes cinematic scene featuring these elements \
             interacting with each other: {descriptions}. Do not just place them side by side; \
             make them fight, hug, argue or plot in a specific, funny setting. Treat the sketches \
             as loose inspiration for composition."
        )));
        parts.push(Self::text_part(SVG_INSTRUCTIONS));

        let reply = self.chat(COMBINE_SYSTEM_PROMPT, parts, 4000).await?;
        let svg = extract_svg(&reply)
            .ok_or_else(|| AiError::ParseError("Reply did not contain an SVG".to_string()))?;
        Ok(svg_data_url(svg))
    }
}

#[async_trait]
impl Collaborator for OpenAiCollaborator {
    async fn combine(&self, sketches: &[Sketch]) -> AiResult<String> {
        if let Some(backend) = &self.combine_backend {
            match backend.combine(sketches).await {
                Ok(image) => return Ok(image),
                Err(e) => tracing::warn!("Combine backend failed: {}, falling back to OpenAI", e),
            }
        }
        self.combine_with_openai(sketches).await
    }

    async fn trivia_for(&self, image: &str) -> AiResult<TriviaQuestion> {
        let parts = vec![Self::image_part(image), Self::text_part(TRIVIA_PROMPT)];
        let reply = self
            .chat("You write trivia questions for a party game.", parts, 400)
            .await?;
        parse_trivia(&reply)
    }

    async fn roast_for(
        &self,
        image: &str,
        judge: JudgeStyle,
        nouns: &[String],
    ) -> AiResult<String> {
        let parts = vec![
            Self::image_part(image),
            Self::text_part(format!(
                "The players were asked to draw: {}. Look at the final image generated from \
                 their bad drawings. Give me a ONE SENTENCE roast about how chaotic or weird the \
                 result is. Do not mention specific players, just the art.",
                nouns.join(", ")
            )),
        ];
        let reply = self.chat(judge.persona(), parts, 120).await?;
        let roast = reply.trim_matches(|c: char| c == '"' || c.is_whitespace());
        if roast.is_empty() {
            return Err(AiError::ParseError("Judge had no words".to_string()));
        }
        Ok(roast.to_string())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_images_become_text_parts() {
        let part = OpenAiCollaborator::image_part(&svg_data_url("<svg></svg>"));
        assert!(matches!(
            part,
            ChatCompletionRequestUserMessageContentPart::Text(ref t) if t.text.contains("<svg></svg>")
        ));

        let part = OpenAiCollaborator::image_part("data:image/png;base64,AAEC");
        assert!(matches!(
            part,
            ChatCompletionRequestUserMessageContentPart::ImageUrl(_)
        ));
    }

    #[tokio::test]
    #[ignore] // Only run with actual API key
    async fn test_openai_trivia() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let collaborator = OpenAiCollaborator::new(api_key, "gpt-4o-mini".to_string());

        let image = svg_data_url(
            "<svg xmlns=\"http://www.w3.org/2000/svg\"><circle r=\"5\" fill=\"green\"/></svg>",
        );
        let trivia = collaborator.trivia_for(&image).await.unwrap();
        assert!(trivia.is_usable());
    }
}
