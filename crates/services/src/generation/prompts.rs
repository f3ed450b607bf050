//! Prompt templates and response schemas.
//!
//! All learner-facing text is requested in Argentine Spanish regardless of
//! the subject being studied.

use sabelo_core::model::QuizQuestion;
use serde_json::{Value, json};

pub const FILES_SYLLABUS_PROMPT: &str = "Sos un experto en educación. Analizá estos archivos (que pueden ser imágenes o documentos PDF de apuntes de estudio) y generá un plan de estudios completo. Identificá el tema principal y usalo como 'subject'. La respuesta debe ser un objeto JSON con 'subject' y un array 'topics'. Cada tema debe tener un 'title' y una 'description' corta. Proporcioná de 5 a 7 temas. Importante: El plan de estudios (el 'subject', los 'title' y las 'description' de los temas) debe estar siempre en español de Argentina para que el usuario pueda entenderlo, independientemente del idioma del contenido de los apuntes. Si los archivos no son claros o relevantes, respondé con un error.";

#[must_use]
pub fn syllabus_prompt(subject: &str) -> String {
    format!(
        "Generá un plan de estudios para el tema '{subject}'. La respuesta debe ser un objeto JSON con un array 'topics'. Cada tema debe tener un 'title' (título) y una 'description' (descripción) corta. Proporcioná de 5 a 7 temas principales. Importante: El plan de estudios (los 'title' y las 'description' de los temas) debe estar siempre en español de Argentina, sin importar cuál sea el tema a estudiar."
    )
}

#[must_use]
pub fn materials_prompt(subject: &str, topic: &str) -> String {
    format!(
        "Sos un experto creador de materiales de estudio que actúa como un profesor particular. El tema general es '{subject}'. El subtema específico es '{topic}'.
Tu tarea es crear un paquete de estudio coherente y unificado. La respuesta debe ser un único objeto JSON que contenga:
1.  'flashcards': Un array de 10 flashcards (tarjetas de estudio) sobre '{topic}'.
2.  'quiz': Un array de 5 preguntas de cuestionario de opción múltiple.

REGLA MÁS IMPORTANTE: El 'quiz' DEBE estar directamente basado en la información presentada en las 'flashcards'. Cada pregunta del cuestionario debe evaluar un concepto enseñado en las tarjetas.

Reglas de Idioma y Contenido para Flashcards:
- Cada flashcard: 'id' (número), 'question' (pregunta), 'answer' (respuesta).
- Si '{subject}' es para aprender un idioma (ej: 'inglés'): 'question' en español, 'answer' en el idioma de estudio, y añadí un campo 'translation' con la traducción de la respuesta al español entre paréntesis.
- Para otros temas: 'question' y 'answer' en español, sin 'translation'.

Reglas de Idioma y Contenido para el Cuestionario:
- Cada pregunta del quiz: 'question' (texto), 'options' (array de 4 strings), 'correctAnswer' (una de las opciones), y 'explanation' (explicación de por qué es correcta).
- Si '{subject}' es para aprender un idioma: 'question' en español, pero 'options' y 'correctAnswer' en el idioma de estudio.
- Para otros temas: todo el contenido en español.
- La 'explanation' SIEMPRE debe estar en español de Argentina."
    )
}

/// Prompt asking for a tip about the missed questions, or `None` when there
/// are none to talk about.
#[must_use]
pub fn suggestion_prompt(
    subject: &str,
    topic: &str,
    quiz: &[QuizQuestion],
    answers: &[String],
) -> Option<String> {
    let missed: Vec<String> = quiz
        .iter()
        .enumerate()
        .filter_map(|(index, question)| {
            let answer = answers.get(index).map(String::as_str);
            if answer.is_some_and(|a| question.is_correct(a)) {
                return None;
            }
            Some(format!(
                "- Pregunta: \"{}\"\n  - Respuesta correcta: \"{}\"\n  - Tu respuesta: \"{}\"",
                question.question,
                question.correct_answer,
                answer.unwrap_or("(sin respuesta)")
            ))
        })
        .collect();
    if missed.is_empty() {
        return None;
    }

    Some(format!(
        "Sos un tutor de IA amigable y motivador. Un estudiante está aprendiendo sobre '{subject}', específicamente el tema '{topic}', y se equivocó en estas preguntas:\n{}\n\nBasado en estos errores, dale un consejo de estudio personalizado, conciso y útil en español de Argentina (2-4 frases). El objetivo es ayudarlo a que entienda los conceptos clave que no le quedaron claros. No repitas las preguntas, enfocate en el consejo para mejorar.",
        missed.join("\n")
    ))
}

fn topics_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "description": { "type": "STRING" }
            },
            "required": ["title", "description"]
        }
    })
}

#[must_use]
pub fn syllabus_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": { "topics": topics_schema() },
        "required": ["topics"]
    })
}

#[must_use]
pub fn files_syllabus_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "subject": {
                "type": "STRING",
                "description": "El tema principal identificado en los apuntes."
            },
            "topics": topics_schema()
        },
        "required": ["subject", "topics"]
    })
}

#[must_use]
pub fn materials_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "flashcards": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "NUMBER" },
                        "question": { "type": "STRING" },
                        "answer": { "type": "STRING" },
                        "translation": {
                            "type": "STRING",
                            "description": "Traducción de la respuesta al español, entre paréntesis. Solo para temas de idiomas."
                        }
                    },
                    "required": ["id", "question", "answer"]
                }
            },
            "quiz": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING" },
                        "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "correctAnswer": { "type": "STRING" },
                        "explanation": { "type": "STRING" }
                    },
                    "required": ["question", "options", "correctAnswer", "explanation"]
                }
            }
        },
        "required": ["flashcards", "quiz"]
    })
}
