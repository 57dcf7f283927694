use clap::{Parser, Subcommand};
use likes::analytics::AnalyticsParams;
use likes::guard::{LikeOutcome, UnlikeOutcome};
use likes_cli::{base_dir, handle_error, print_json, Result, Session};

#[derive(Parser)]
#[command(version, about = "Likes, unlikes and like analytics", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database.
    Init {
        /// Database connection string. For sqlite, a file path.
        connection: String,
        /// Database backend to use.
        #[arg(long, default_value = "sqlite")]
        backend: String,
        /// Offset from UTC, in minutes, that decides the day a like counts towards.
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        utc_offset: i32,
    },
    /// Manage users.
    #[command(subcommand, arg_required_else_help = true)]
    User(UserCommands),
    /// Manage posts.
    #[command(subcommand, arg_required_else_help = true)]
    Post(PostCommands),
    /// Like a post.
    Like {
        /// Acting user, by name or id.
        #[arg(long = "as")]
        who: String,
        post: String,
    },
    /// Remove a like.
    Unlike {
        /// Acting user, by name or id.
        #[arg(long = "as")]
        who: String,
        post: String,
    },
    /// Likes per day, as JSON.
    Analytics {
        /// Acting user, by name or id.
        #[arg(long = "as")]
        who: String,
        /// First day counted, YYYY-MM-DD.
        #[arg(long)]
        date_from: Option<String>,
        /// Last day counted, YYYY-MM-DD.
        #[arg(long)]
        date_to: Option<String>,
        /// `all` or a user id. Defaults to the acting user.
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user and print its id.
    Add {
        username: String,
        email: String,
        #[arg(long)]
        superuser: bool,
    },
    /// Record a login.
    Login { user: String },
    /// Show last login and last request, as JSON.
    Activity {
        /// Acting user, by name or id.
        #[arg(long = "as")]
        who: String,
        /// User id to show. Defaults to the acting user.
        user: Option<String>,
    },
    /// Delete a user with their posts and likes. Only the user or a
    /// superuser may do this.
    Delete {
        /// Acting user, by name or id.
        #[arg(long = "as")]
        who: String,
        user: String,
    },
}

#[derive(Subcommand)]
enum PostCommands {
    /// Write a post and print its id.
    Add {
        /// Acting user, by name or id.
        #[arg(long = "as")]
        who: String,
        title: String,
        content: String,
    },
    /// List posts, newest first, as JSON.
    List {
        /// Only posts of this user.
        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete a post.
    Delete {
        /// Acting user, by name or id.
        #[arg(long = "as")]
        who: String,
        post: String,
    },
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();
    handle_error(run(cli.command));
}

fn run(command: Commands) -> Result<()> {
    let base = base_dir()?;
    let open = || Session::open(&base);
    match command {
        Commands::Init {
            connection,
            backend,
            utc_offset,
        } => likes_cli::init(&base, &backend, &connection, utc_offset),
        Commands::User(UserCommands::Add {
            username,
            email,
            superuser,
        }) => {
            let user = likes_cli::add_user(&open()?, &username, &email, superuser)?;
            println!("{}", user.id);
            Ok(())
        }
        Commands::User(UserCommands::Login { user }) => likes_cli::login(&open()?, &user),
        Commands::User(UserCommands::Activity { who, user }) => {
            print_json(&likes_cli::activity(&open()?, &who, user.as_deref())?)
        }
        Commands::User(UserCommands::Delete { who, user }) => {
            likes_cli::delete_user(&mut open()?, &who, &user)
        }
        Commands::Post(PostCommands::Add {
            who,
            title,
            content,
        }) => {
            let post = likes_cli::add_post(&open()?, &who, &title, &content)?;
            println!("{}", post.id);
            Ok(())
        }
        Commands::Post(PostCommands::List { owner }) => {
            print_json(&likes_cli::list_posts(&open()?, owner.as_deref())?)
        }
        Commands::Post(PostCommands::Delete { who, post }) => {
            likes_cli::delete_post(&open()?, &who, &post)
        }
        Commands::Like { who, post } => {
            match likes_cli::like(&mut open()?, &who, &post)? {
                LikeOutcome::Liked => println!("Liked"),
                LikeOutcome::AlreadyLiked => println!("Already liked"),
            }
            Ok(())
        }
        Commands::Unlike { who, post } => {
            match likes_cli::unlike(&mut open()?, &who, &post)? {
                UnlikeOutcome::Unliked => println!("Unliked"),
                UnlikeOutcome::NotLiked => println!("Not liked"),
            }
            Ok(())
        }
        Commands::Analytics {
            who,
            date_from,
            date_to,
            user,
        } => {
            let params = AnalyticsParams {
                date_from,
                date_to,
                user,
            };
            print_json(&likes_cli::analytics(&open()?, &who, &params)?)
        }
    }
}
