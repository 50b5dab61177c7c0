use super::dto::AnalysisContext;

/// Extraction instruction for the vision backend. Pure: the same context
/// always yields byte-identical text. Context values are embedded verbatim.
pub fn build_prompt(context: &AnalysisContext) -> String {
    let meal = context.meal_type.as_str();
    let goal = context.diet_goal.as_str();
    format!(
        r#"Analyze this image of food. Identify the food item(s) and provide a nutritional breakdown.

Context provided by the user:
- Meal type: {meal}
- Diet goal: {goal}

Rules:
1. "calories", "proteins", "carbs" and "fats" must reflect only the physical food and the portion visible in the image. Do NOT adjust these values based on the time of day or the meal type label.
2. Add entries to "warnings" only when the food is exceptionally high in sugar, fat, carbohydrates or calories relative to dietary guidance for the stated meal type ({meal}), keeping the diet goal ({goal}) in mind. Otherwise "warnings" must be an empty array [].
3. Return strictly valid JSON and nothing else: no markdown, no code fences, no prose before or after the object.

Return a single JSON object with exactly these keys and no others:
{{
  "foodName": "Name of the food",
  "calories": "Total calories (e.g. 250 kcal)",
  "proteins": "Total proteins in grams (e.g. 10g)",
  "carbs": "Total carbohydrates in grams (e.g. 30g)",
  "fats": "Total fats in grams (e.g. 5g)",
  "description": "A very brief 1-sentence description of the food",
  "warnings": ["Short warning, only if applicable"]
}}"#
    )
}
