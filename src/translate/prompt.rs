use crate::database::DatabaseSchema;

pub const INPUT_PLACEHOLDER: &str = "{input}";

const INTRO: &str = "You are an intelligent assistant that translates user instructions into optimized SQLite queries based on the schema below.\n";

const GUIDELINES: &str = "

Generate optimized SQL queries following these guidelines:
1. If the request has multiple parts, write multiple SQL statements separated by semicolons and new lines.
2. Use appropriate indexes and JOIN strategies (INNER, LEFT, RIGHT) based on the data relationships
3. Use meaningful table aliases (e.g., 'c' for customers, 'o' for orders)
4. Include column aliases for computed values or aggregations accordingly
5. Use appropriate WHERE clauses to filter data early in the execution
6. Consider using subqueries or CTEs (Common Table Expressions) for complex operations
7. Group and order results meaningfully when aggregating data
8. Use LIMIT when returning large result sets if not specified by the user

After ALL queries, provide a brief simple explanation of:
- Why specific JOIN types were chosen
- Any performance considerations
- How the query handles edge cases

Format your response as:
SQL:
<your SQL queries here>

EXPLANATION:
<your detailed explanation here>
";

pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "Show me all customers from California",
    "What are the top 5 products by sales quantity?",
    "Find total revenue by customer in 2023",
    "List all orders with their customer names and total amounts",
];

/// Builds the translation template once. The only free slot left in it is
/// [`INPUT_PLACEHOLDER`].
pub fn build_translation_template(schema: &DatabaseSchema) -> String {
    let mut parts = vec![INTRO.to_string(), "Schema:".to_string()];
    parts.extend(schema.render_prompt_lines());

    let mut template = parts.join("\n");
    template.push_str(GUIDELINES);
    template.push_str("\n\nUser Input: ");
    template.push_str(INPUT_PLACEHOLDER);
    template.push_str("\nResponse:");
    template
}

/// Substitutes the question into the template. Braces inside the schema or
/// the question are left untouched.
pub fn render_translation_prompt(template: &str, question: &str) -> String {
    match template.rfind(INPUT_PLACEHOLDER) {
        Some(pos) => format!(
            "{}{}{}",
            &template[..pos],
            question,
            &template[pos + INPUT_PLACEHOLDER.len()..]
        ),
        None => format!("{}\n{}", template, question),
    }
}
