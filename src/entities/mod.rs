pub mod genre;
pub mod library_entry;
pub mod movie;
pub mod movie_company;
pub mod movie_credit;
pub mod movie_genre;
pub mod person;
pub mod production_company;
pub mod review;
pub mod tv_show;
pub mod user;
