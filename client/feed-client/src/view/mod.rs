pub mod post_card;
