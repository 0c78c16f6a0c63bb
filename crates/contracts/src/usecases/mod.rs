pub mod u603_rankings;
