/// Built-in recipes used when a request names a dish but supplies no text.
const SAMPLE_RECIPES: &[(&str, &str)] = &[
    (
        "spaghetti bolognese",
        "Spaghetti Bolognese
Ingredients:
- 400 g spaghetti
- 500 g ground beef
- 1 onion, finely chopped
- 2 garlic cloves, minced
- 1 carrot, diced
- 400 g canned crushed tomatoes
- 2 tbsp tomato paste
- 120 ml red wine
- Parmesan, to serve
Steps:
1. Brown the beef in a large pan and set aside.
2. Soften the onion, carrot and garlic in the same pan.
3. Add the tomato paste, wine and tomatoes, return the beef and simmer 30 minutes.
4. Cook the spaghetti, toss with the sauce and serve with Parmesan.",
    ),
    (
        "chicken curry",
        "Chicken Curry
Ingredients:
- 600 g chicken thighs, cubed
- 1 onion, sliced
- 3 garlic cloves, minced
- 1 tbsp grated ginger
- 2 tbsp curry powder
- 400 ml coconut milk
- 1 tbsp fish sauce
Steps:
1. Fry the onion, garlic and ginger until fragrant.
2. Add the curry powder, then the chicken, and brown lightly.
3. Pour in the coconut milk and fish sauce and simmer 20 minutes.
4. Serve with rice.",
    ),
    (
        "beef tacos",
        "Beef Tacos
Ingredients:
- 500 g ground beef
- 1 packet taco seasoning
- 8 corn tortillas
- 1 cup shredded cheddar
- 1 cup shredded lettuce
- 1 tomato, diced
- Sour cream, to serve
Steps:
1. Brown the beef and stir in the seasoning with a splash of water.
2. Warm the tortillas in a dry pan.
3. Fill with beef, cheese, lettuce and tomato, and top with sour cream.",
    ),
    (
        "caesar salad",
        "Caesar Salad
Ingredients:
- 1 head romaine lettuce
- 4 anchovy fillets
- 1 egg yolk
- 1 garlic clove
- 2 tbsp lemon juice
- 120 ml olive oil
- 50 g Parmesan, grated
- 2 cups wheat bread croutons
Steps:
1. Mash the anchovies and garlic, whisk in the yolk and lemon juice.
2. Slowly whisk in the olive oil to make the dressing.
3. Toss the lettuce with dressing, Parmesan and croutons.",
    ),
];

fn normalize_dish_name(dish_name: &str) -> String {
    dish_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn sample_recipe(dish_name: &str) -> Option<&'static str> {
    let key = normalize_dish_name(dish_name);
    SAMPLE_RECIPES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, recipe)| *recipe)
}

pub fn sample_dish_names() -> impl Iterator<Item = &'static str> {
    SAMPLE_RECIPES.iter().map(|(name, _)| *name)
}

/// Recipe text to feed the pipeline: the caller's text if any, else a sample
/// for the dish, else a bare "Recipe for <dish>" stub.
pub fn resolve_recipe_text(dish_name: &str, provided: &str) -> String {
    let provided = provided.trim();
    if !provided.is_empty() {
        return provided.to_string();
    }
    match sample_recipe(dish_name) {
        Some(recipe) => recipe.to_string(),
        None => format!("Recipe for {}", dish_name.trim()),
    }
}
