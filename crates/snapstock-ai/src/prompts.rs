//! Prompt builders for the three generation requests.

/// Prompt for the main image-to-product extraction. OCR text, when present,
/// is the authoritative source for any printed text (brand, model, price).
#[must_use]
pub fn product_extraction(ocr_text: &str, currency: &str, country: &str) -> String {
    format!(
        r#"You are a product data extraction engine. You MUST populate every field with useful content so the result can be used directly in a product listing.

Analyze this image and the OCR TEXT below. The image can be ANY product: packaged goods, unpackaged items, handmade goods, produce, clothing, electronics, furniture, art, food, accessories, etc. Describe exactly what you see.

- If there is a brand, logo, or printed text (on packaging, label, tag, or product): extract it with SUPER ACCURACY. Use the exact spelling and wording from OCR or the image. Do NOT guess or approximate brand names.
- If there is no brand or label: describe the product from what you see (appearance, material, color, shape, likely use). Invent a clear, descriptive title (e.g. "Handmade Ceramic Mug", "Organic Red Apple").
- OCR TEXT is the primary source for any printed text (brand, model, ingredients, price). Use it when present; otherwise rely on visual description.

OCR TEXT:
"""
{ocr_text}
"""

RULES:
- Brand names: use ONLY what appears in OCR or clearly on the image. Exact spelling. If unsure, omit brand from title and put a generic product name.
- You MUST fill in every field. No field may be empty or minimal.
- Work for every type of product: packaged or unpackaged, famous brand or no brand, physical item only.
- NEVER use a generic title like "Scanned Item" or "Product". Always describe what you see so the title adds value.

FIELD REQUIREMENTS:
1. "title": Full product name. If brand is visible (OCR or logo): "BRAND + Product/Model name". If no brand or unclear: describe what you see. Never use "Scanned Item".
2. "descriptionHtml": MUST be proper HTML. Include one short <p> describing what the product is and what you see, and a <ul> with <li> bullets: features, specs, or visual details. Minimum 2-3 bullets.
3. "productType": One clear category. Use: Electronics, Food & Beverages, Health & Beauty, Clothing & Accessories, Home & Garden, Sports & Outdoors, Toys & Games, Pet Supplies, Office Supplies, Art & Collectibles, or a close match. Single category phrase.
4. "tags": Non-empty array of 3-8 lowercase tags: include brand if visible (exact), product type, materials/features. Never return [].
5. "estimatedWeight": Number in grams. REQUIRED. Use weight from packaging if shown (convert kg to g). Otherwise estimate by what you see. Never use 0.
6. "price": REQUIRED. Use price from OCR/sticker if visible. Otherwise estimate a reasonable retail price in {currency} ({country}) for this product type. Return numeric string (e.g. "24.99").
7. "status": "DRAFT"

Return ONLY a JSON object, no other text:
{{
    "title": "string",
    "descriptionHtml": "string with <p> and <ul><li>...</li></ul>",
    "productType": "string",
    "tags": ["tag1", "tag2", "tag3"],
    "estimatedWeight": number,
    "price": "string (numeric, never empty)",
    "status": "DRAFT"
}}"#
    )
}

/// Prompt for the short fallback description used when the main extraction
/// fails: one phrase, no quotes, no punctuation.
#[must_use]
pub fn brief_description() -> String {
    "Look at this image. In one short phrase (2-10 words), describe what you see, e.g. \
     object, color, setting. Examples: \"Blue two-slot toaster on grey surface\", \
     \"Handmade ceramic mug\", \"Red running shoes\". Reply with ONLY that phrase, \
     no quotes or punctuation."
        .to_string()
}

/// Prompt for the AI variant splitter (multi-option transcripts the
/// deterministic parser cannot handle).
#[must_use]
pub fn variant_parsing(transcript: &str) -> String {
    format!(
        r#"Parse the following natural language description of product variants (like sizes, colors, materials, and optional quantities per value) into a structured JSON format.

Input: "{transcript}"

Return ONLY a JSON object in this format:
{{
    "options": [
        {{
            "name": "Option Name (e.g. Size, Color, Material)",
            "values": ["Value1", "Value2", "Value3"],
            "quantities": [optional array of numbers, one per value]
        }}
    ]
}}

Rules:
- Extract every variant value the user mentions. For "small 4, medium 5, large 7" output one option with name "Size", values ["small", "medium", "large"], and quantities [4, 5, 7].
- If the user gives numbers after values, include a "quantities" array with the same length as "values".
- Multiple option types: "sizes S M L and colors red, blue" means two options: Size with values [S,M,L], Color with values [red, blue]. Omit quantities if not specified.
- Use clear option names: Size, Color, Material, etc. Values must be strings; quantities must be numbers.

If no clear variants are mentioned, return: {{ "options": [] }}"#
    )
}
