use docent_index::ScoredChunk;

pub const DEFAULT_TEMPLATE: &str = "Eres un asistente experto en investigación del INAOE. Tu tarea es responder a la pregunta del usuario de la forma más completa y precisa posible.

Para ello, debes seguir estas reglas:
1.  **COMBINA CONOCIMIENTO:** Fusiona tu propio conocimiento general sobre ciencia, tecnología y el INAOE con la información específica encontrada en los siguientes documentos de contexto.
2.  **PRIORIZA EL CONTEXTO:** Si la respuesta se encuentra en los documentos, dale prioridad a esa información para que la respuesta sea fundamentada.
3.  **USA CONOCIMIENTO GENERAL:** Si los documentos no contienen información relevante para la pregunta (o si el contexto está vacío), responde utilizando tu conocimiento general. No te limites a decir \"no encontré información\".
4.  **SÉ COMPLETO:** Proporciona respuestas detalladas y bien estructuradas, adecuadas para un público de investigadores.

A continuación, se presenta el contexto y la pregunta.

CONTEXTO DE LOS DOCUMENTOS:
{context}

PREGUNTA: {question}

RESPUESTA EXPERTA:";

/// Template with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PromptTemplate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fill the template. Chunk texts are joined by a blank line in the given order.
    #[must_use]
    pub fn render(&self, chunks: &[ScoredChunk<'_>], question: &str) -> String {
        let context = chunks
            .iter()
            .map(|c| c.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        // Placeholders are substituted in the template only, never inside chunk text.
        match self.template.split_once("{context}") {
            Some((before, after)) => format!(
                "{}{context}{}",
                before.replace("{question}", question),
                after.replace("{question}", question)
            ),
            None => self.template.replace("{question}", question),
        }
    }
}
