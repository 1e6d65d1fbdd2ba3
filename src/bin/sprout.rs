//! sprout: vegan recipe generator CLI
//!
//! Generates recipes through the configured tiers and manages the local
//! notebook of saved recipes.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sprout::notebook::RecipePatch;
use sprout::{
    Config, GenerationOutcome, GenerationRequest, Notebook, Recipe, RecipeGenerator, SavedRecipe,
    Secrets, Sprout,
};

/// Sprout recipe generator
#[derive(Parser)]
#[command(name = "sprout")]
#[command(version = sprout::version::PKG_VERSION)]
#[command(about = "AI vegan recipe generator")]
struct Args {
    /// Config file (default: ~/.sprout/config.toml, then /etc/sprout/config.toml)
    #[arg(short, long, env = "SPROUT_CONFIG")]
    config: Option<PathBuf>,

    /// Notebook file (overrides the config)
    #[arg(long, env = "SPROUT_NOTEBOOK")]
    notebook: Option<PathBuf>,

    /// Print recipes as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a recipe from ingredients
    Generate {
        /// Ingredient (repeatable)
        #[arg(short, long = "ingredient", required = true)]
        ingredients: Vec<String>,
        /// Dietary restriction, e.g. nut-free (repeatable)
        #[arg(short, long = "restriction")]
        restrictions: Vec<String>,
        #[arg(long)]
        cuisine: Option<String>,
        #[arg(long)]
        meal: Option<String>,
        /// Number of servings (1-10)
        #[arg(long)]
        servings: Option<u32>,
        /// Save the result to the notebook
        #[arg(long)]
        save: bool,
    },

    /// Rewrite a saved recipe
    Edit {
        id: String,
        /// What to change, e.g. "make it spicier"
        instructions: String,
    },

    /// Generate a photo for a saved recipe
    Image { id: String },

    /// Build a shopping list for a saved recipe
    Shopping {
        id: String,
        /// Country used to localise item names
        #[arg(long)]
        country: Option<String>,
    },

    /// List saved recipes, newest first
    List,

    /// Show a saved recipe
    Show { id: String },

    /// Delete a saved recipe
    Remove { id: String },

    /// Rate a saved recipe (1-5)
    Review {
        id: String,
        rating: u8,
        comment: Option<String>,
    },

    /// Attach a note to a saved recipe
    Note {
        id: String,
        title: String,
        content: String,
    },

    /// Print version and build information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Command::Version = args.command {
        println!("sprout {}", sprout::version::version_string());
        println!("built: {}", sprout::version::BUILD_TIMESTAMP);
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;
    let notebook_path = args.notebook.unwrap_or_else(|| config.notebook_path());
    let json = args.json;

    match args.command {
        Command::Generate {
            ingredients,
            restrictions,
            cuisine,
            meal,
            servings,
            save,
        } => {
            let generator = build_generator(&config)?;
            let mut request = GenerationRequest::new(ingredients).restrictions(restrictions);
            if let Some(cuisine) = cuisine {
                request = request.cuisine(cuisine);
            }
            if let Some(meal) = meal {
                request = request.meal(meal);
            }
            if let Some(servings) = servings {
                request = request.servings(servings);
            }

            match generator.generate(request).await {
                GenerationOutcome::Fulfilled(recipe) => {
                    print_recipe(&recipe, json)?;
                    if save {
                        let mut notebook = Notebook::open(notebook_path).await?;
                        let id = notebook.save(recipe).await?;
                        println!("\nsaved as {id}");
                    }
                }
                GenerationOutcome::Rejected(message) => return Err(message.into()),
                GenerationOutcome::Superseded => {}
            }
        }

        Command::Edit { id, instructions } => {
            let generator = build_generator(&config)?;
            let mut notebook = Notebook::open(notebook_path).await?;
            let original = find(&notebook, &id)?.recipe.clone();
            let edited = generator.edit(&original, &instructions).await?;
            let saved = notebook
                .update(&id, RecipePatch::from_recipe(edited))
                .await?;
            print_recipe(&saved.recipe, json)?;
        }

        Command::Image { id } => {
            let generator = build_generator(&config)?;
            let mut notebook = Notebook::open(notebook_path).await?;
            let recipe = find(&notebook, &id)?.recipe.clone();
            match generator
                .generate_image(&recipe.title, &recipe.ingredients)
                .await?
            {
                Some(uri) => {
                    notebook
                        .update(
                            &id,
                            RecipePatch {
                                image_url: Some(uri.clone()),
                                ..RecipePatch::default()
                            },
                        )
                        .await?;
                    if uri.starts_with("data:") {
                        println!("image saved ({} bytes inline)", uri.len());
                    } else {
                        println!("{uri}");
                    }
                }
                None => println!("no image generated"),
            }
        }

        Command::Shopping { id, country } => {
            let generator = build_generator(&config)?;
            let notebook = Notebook::open(notebook_path).await?;
            let recipe = &find(&notebook, &id)?.recipe;
            let list = generator
                .shopping_list(&recipe.ingredients, country.as_deref())
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for (category, items) in &list.categories {
                    println!("{category}:");
                    for item in items {
                        println!("  - {item}");
                    }
                }
            }
        }

        Command::List => {
            let notebook = Notebook::open(notebook_path).await?;
            let recipes = notebook.list();
            if recipes.is_empty() {
                println!("no saved recipes");
            }
            for saved in recipes {
                let rating = saved
                    .average_rating()
                    .map(|r| format!(" ({r:.1}/5)"))
                    .unwrap_or_default();
                println!("{}  {}{rating}", saved.id, saved.recipe.title);
            }
        }

        Command::Show { id } => {
            let notebook = Notebook::open(notebook_path).await?;
            let saved = find(&notebook, &id)?;
            print_recipe(&saved.recipe, json)?;
            if !json {
                for review in &saved.reviews {
                    println!("\n{}/5 {}", review.rating, review.comment);
                }
                for note in &saved.notes {
                    println!("\n# {}\n{}", note.title, note.content);
                }
            }
        }

        Command::Remove { id } => {
            let mut notebook = Notebook::open(notebook_path).await?;
            let removed = notebook.remove(&id).await?;
            println!("removed {}", removed.recipe.title);
        }

        Command::Review {
            id,
            rating,
            comment,
        } => {
            let mut notebook = Notebook::open(notebook_path).await?;
            notebook
                .add_review(&id, rating, comment.as_deref().unwrap_or_default())
                .await?;
            println!("review added");
        }

        Command::Note { id, title, content } => {
            let mut notebook = Notebook::open(notebook_path).await?;
            let note_id = notebook.add_note(&id, &title, &content).await?;
            println!("note {note_id} added");
        }

        // Printed before loading config.
        Command::Version => {}
    }

    Ok(())
}

fn build_generator(config: &Config) -> sprout::Result<RecipeGenerator> {
    Sprout::builder()
        .from_config(config, &Secrets::from_env())
        .build()
}

fn find<'a>(notebook: &'a Notebook, id: &str) -> sprout::Result<&'a SavedRecipe> {
    notebook
        .get(id)
        .ok_or_else(|| sprout::SproutError::NotFound(format!("recipe {id}")))
}

fn print_recipe(recipe: &Recipe, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
        return Ok(());
    }

    println!("{}", recipe.title);
    if let Some(description) = &recipe.description {
        println!("{description}");
    }
    let times: Vec<String> = [
        recipe.prep_time.as_deref().map(|t| format!("prep {t}")),
        recipe.cook_time.as_deref().map(|t| format!("cook {t}")),
        recipe.servings.as_deref().map(|s| format!("serves {s}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !times.is_empty() {
        println!("{}", times.join(" · "));
    }

    println!("\nIngredients:");
    for ingredient in &recipe.ingredients {
        println!("  - {ingredient}");
    }
    println!("\nInstructions:");
    for (n, step) in recipe.instructions.iter().enumerate() {
        println!("  {}. {step}", n + 1);
    }
    if !recipe.cooking_tips.is_empty() {
        println!("\nTips:");
        for tip in &recipe.cooking_tips {
            println!("  - {tip}");
        }
    }
    Ok(())
}
